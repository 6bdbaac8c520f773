//! Predicates over fetched time entries.

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::types::{EvaluationResult, LinkedUser, Project, ReportingWindow, TimeEntry};

/// True iff anything at all was logged for the reporting day.
pub fn has_timesheeted(entries: &[TimeEntry]) -> bool {
    !entries.is_empty()
}

/// Flag each user with no entries for the reporting day.
pub fn evaluate_users(
    fetched: Vec<(LinkedUser, Vec<TimeEntry>)>,
) -> Vec<EvaluationResult<LinkedUser>> {
    fetched
        .into_iter()
        .map(|(subject, entries)| EvaluationResult {
            flagged: !has_timesheeted(&entries),
            subject,
            entries,
        })
        .collect()
}

/// Subjects of flagged results, in order.
pub fn flagged_subjects<S>(results: Vec<EvaluationResult<S>>) -> Vec<S> {
    results
        .into_iter()
        .filter(|r| r.flagged)
        .map(|r| r.subject)
        .collect()
}

/// Both entry partitions fetched for one project.
#[derive(Debug, Clone)]
pub struct ProjectEntries {
    pub project: Project,
    pub billable: Vec<TimeEntry>,
    pub non_billable: Vec<TimeEntry>,
}

impl ProjectEntries {
    /// Nothing logged against the project either way.
    pub fn is_silent(&self) -> bool {
        self.billable.is_empty() && self.non_billable.is_empty()
    }
}

/// Drop silent projects and merge the partitions of the rest.
///
/// Silent projects are excluded from aggregation rather than counted as zero.
pub fn evaluate_projects(fetched: Vec<ProjectEntries>) -> Vec<EvaluationResult<Project>> {
    fetched
        .into_iter()
        .filter(|p| !p.is_silent())
        .map(|p| {
            let mut entries = p.billable;
            entries.extend(p.non_billable);
            EvaluationResult {
                subject: p.project,
                entries,
                flagged: false,
            }
        })
        .collect()
}

/// Projects that could have entries inside `window`.
///
/// A project whose latest record predates the window is skipped before any
/// entries are fetched. Projects without a known last activity are kept.
pub fn active_in_window(projects: Vec<Project>, window: &ReportingWindow, tz: Tz) -> Vec<Project> {
    projects
        .into_iter()
        .filter(|project| match project.last_activity {
            Some(ts) => local_date(ts, tz) >= window.from,
            None => true,
        })
        .collect()
}

fn local_date(ts: chrono::DateTime<chrono::Utc>, tz: Tz) -> NaiveDate {
    ts.with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::{ChatAccount, TrackingAccount};

    fn entry(hours: f64, billable: bool) -> TimeEntry {
        TimeEntry {
            owner_id: 1,
            hours,
            billable,
            date: NaiveDate::from_ymd_opt(2026, 10, 13).unwrap(),
        }
    }

    fn user(id: u64) -> LinkedUser {
        LinkedUser {
            tracking_account: TrackingAccount {
                id,
                email: format!("{}@x.com", id),
                first_name: String::new(),
                last_name: String::new(),
                is_active: true,
                is_contractor: false,
            },
            chat_account: ChatAccount {
                id: format!("U{}", id),
                name: format!("user{}", id),
                display_name: format!("User {}", id),
                email: Some(format!("{}@x.com", id)),
                is_deleted: false,
            },
        }
    }

    fn project(id: u64, last_activity: Option<chrono::DateTime<Utc>>) -> Project {
        Project {
            id,
            name: format!("Project {}", id),
            last_activity,
        }
    }

    #[test]
    fn users_without_entries_are_flagged() {
        let results = evaluate_users(vec![
            (user(1), vec![entry(8.0, true)]),
            (user(2), vec![]),
            (user(3), vec![]),
        ]);
        let flagged: Vec<u64> = flagged_subjects(results)
            .iter()
            .map(|u| u.tracking_account.id)
            .collect();
        assert_eq!(flagged, vec![2, 3]);
    }

    #[test]
    fn silent_projects_are_excluded() {
        let results = evaluate_projects(vec![
            ProjectEntries {
                project: project(1, None),
                billable: vec![],
                non_billable: vec![],
            },
            ProjectEntries {
                project: project(2, None),
                billable: vec![],
                non_billable: vec![entry(2.0, false)],
            },
        ]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].subject.id, 2);
        assert_eq!(results[0].entries.len(), 1);
    }

    #[test]
    fn stale_projects_are_filtered_before_fetching() {
        let window = ReportingWindow {
            from: NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(),
            to: NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
        };
        // 2026-10-11T12:00Z is already Monday 01:00 in Auckland.
        let projects = vec![
            project(1, Some(Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap())),
            project(2, Some(Utc.with_ymd_and_hms(2026, 10, 11, 12, 0, 0).unwrap())),
            project(3, None),
        ];

        let active = active_in_window(projects, &window, chrono_tz::Pacific::Auckland);
        let ids: Vec<u64> = active.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
