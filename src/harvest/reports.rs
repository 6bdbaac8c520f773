//! Per-project time reports.
//!
//! Harvest v1 has no combined billable/non-billable project report, so each
//! project is queried twice, once per partition.

use crate::deadline::format_query_date;
use crate::error::ExecutionError;
use crate::evaluate::ProjectEntries;
use crate::harvest::TimeTracker;
use crate::types::{Project, ReportingWindow};

pub fn project_entries_path(project_id: u64) -> String {
    format!("/projects/{}/entries", project_id)
}

/// `from`/`to` as `YYYYMMDD` plus Harvest's `billable=yes|no` filter.
pub fn project_query(window: &ReportingWindow, billable: bool) -> Vec<(&'static str, String)> {
    vec![
        ("from", format_query_date(window.from)),
        ("to", format_query_date(window.to)),
        ("billable", if billable { "yes" } else { "no" }.to_string()),
    ]
}

/// Fetch both partitions for one project concurrently.
///
/// Either request failing fails the whole project.
pub async fn project_entries(
    tracker: &dyn TimeTracker,
    project: Project,
    window: ReportingWindow,
) -> Result<ProjectEntries, ExecutionError> {
    let (billable, non_billable) = tokio::try_join!(
        tracker.entries_for_project(project.id, &window, true),
        tracker.entries_for_project(project.id, &window, false),
    )?;

    log::info!(
        "Billable: fetched project {} ({}): {} billable, {} non-billable entries",
        project.name,
        project.id,
        billable.len(),
        non_billable.len()
    );

    Ok(ProjectEntries {
        project,
        billable,
        non_billable,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::testing::{entry, FakeTracker};

    fn window() -> ReportingWindow {
        ReportingWindow {
            from: NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(),
            to: NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
        }
    }

    #[test]
    fn query_carries_compact_dates_and_flag() {
        let query = project_query(&window(), false);
        assert_eq!(
            query,
            vec![
                ("from", "20261012".to_string()),
                ("to", "20261014".to_string()),
                ("billable", "no".to_string()),
            ]
        );
        assert_eq!(project_entries_path(42), "/projects/42/entries");
    }

    #[tokio::test]
    async fn fetches_both_partitions() {
        let tracker = FakeTracker::default()
            .with_project_entries(7, true, vec![entry(1, 3.0, true)])
            .with_project_entries(7, false, vec![entry(1, 1.0, false), entry(2, 2.0, false)]);
        let project = Project {
            id: 7,
            name: "Site".to_string(),
            last_activity: None,
        };

        let fetched = project_entries(&tracker, project, window()).await.unwrap();
        assert_eq!(fetched.billable.len(), 1);
        assert_eq!(fetched.non_billable.len(), 2);
        assert!(fetched.billable.iter().all(|e| e.billable));
        assert!(fetched.non_billable.iter().all(|e| !e.billable));
    }

    #[tokio::test]
    async fn one_failing_partition_fails_the_project() {
        let tracker = FakeTracker::default()
            .with_project_entries(7, true, vec![entry(1, 3.0, true)])
            .failing_project(7);
        let project = Project {
            id: 7,
            name: "Site".to_string(),
            last_activity: None,
        };

        assert!(project_entries(&tracker, project, window()).await.is_err());
    }
}
