//! Joins Slack members to Harvest people by email.
//!
//! Accounts that only exist on one side (bots, admin accounts) fall out of the
//! join, which leaves just the staff expected to keep timesheets.

use std::collections::{HashMap, HashSet};

use crate::types::{ChatAccount, LinkedUser, TrackingAccount};

/// Whether a tracking account should be nagged at all.
fn is_eligible(account: &TrackingAccount, excluded: &HashSet<String>) -> bool {
    if excluded.contains(&account.email) {
        log::info!("Excluded {}", account.email);
        return false;
    }
    account.is_active && !account.is_contractor
}

/// Join chat and tracking accounts on exact email match.
///
/// Output follows the order of `tracking`. Duplicate emails on either side
/// resolve to the first account seen.
pub fn join(
    chat: &[ChatAccount],
    tracking: &[TrackingAccount],
    excluded: &HashSet<String>,
) -> Vec<LinkedUser> {
    let mut by_email: HashMap<&str, &ChatAccount> = HashMap::new();
    for account in chat.iter().filter(|a| !a.is_deleted) {
        if let Some(email) = account.email.as_deref() {
            by_email.entry(email).or_insert(account);
        }
    }

    let mut linked_emails: HashSet<&str> = HashSet::new();
    tracking
        .iter()
        .filter(|account| is_eligible(account, excluded))
        .filter_map(|account| {
            let chat_account = by_email.get(account.email.as_str())?;
            if !linked_emails.insert(account.email.as_str()) {
                return None;
            }
            Some(LinkedUser {
                tracking_account: account.clone(),
                chat_account: (*chat_account).clone(),
            })
        })
        .collect()
}


#[cfg(test)]
mod properties {
    use proptest::prelude::*;
    use proptest::test_runner::Config;

    use super::*;

    fn email(index: u8) -> String {
        format!("p{}@x.com", index)
    }

    proptest! {
        #![proptest_config(Config::with_cases(128))]
        #[test]
        fn only_eligible_live_accounts_are_joined(
            people in prop::collection::vec((0_u8..6, any::<bool>(), any::<bool>()), 0..12),
            members in prop::collection::vec((0_u8..6, any::<bool>()), 0..12),
            excluded in prop::collection::hash_set(0_u8..6, 0..3)
        ) {
            let tracking: Vec<TrackingAccount> = people
                .into_iter()
                .enumerate()
                .map(|(id, (e, is_active, is_contractor))| TrackingAccount {
                    id: id as u64,
                    email: email(e),
                    first_name: String::new(),
                    last_name: String::new(),
                    is_active,
                    is_contractor,
                })
                .collect();
            let chat: Vec<ChatAccount> = members
                .into_iter()
                .enumerate()
                .map(|(id, (e, is_deleted))| ChatAccount {
                    id: format!("U{}", id),
                    name: format!("u{}", id),
                    display_name: format!("U{}", id),
                    email: Some(email(e)),
                    is_deleted,
                })
                .collect();
            let excluded: HashSet<String> = excluded.into_iter().map(email).collect();

            let linked = join(&chat, &tracking, &excluded);

            let mut seen = HashSet::new();
            for user in &linked {
                prop_assert!(user.tracking_account.is_active);
                prop_assert!(!user.tracking_account.is_contractor);
                prop_assert!(!excluded.contains(&user.tracking_account.email));
                prop_assert!(!user.chat_account.is_deleted);
                prop_assert_eq!(
                    user.chat_account.email.as_deref(),
                    Some(user.tracking_account.email.as_str())
                );
                prop_assert!(seen.insert(user.tracking_account.email.clone()));
            }
        }
    }
}
