//! Scheduler for cron-based workflow execution
//!
//! Manages scheduled jobs with support for:
//! - Cron expression parsing
//! - Timezone-aware scheduling
//! - Time-jump detection via polling (suspended hosts, clock changes)
//! - Missed job handling (runs if within grace period)

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use tokio::sync::mpsc;

use crate::error::ExecutionError;
use crate::state::AppState;
use crate::types::{ExecutionTrigger, ScheduleEntry, WorkflowId};

/// Grace period for missed jobs (2 hours)
const MISSED_JOB_GRACE_PERIOD_SECS: i64 = 7200;

/// Time jump threshold that triggers a missed-job sweep (5 minutes)
const TIME_JUMP_THRESHOLD_SECS: i64 = 300;

/// Poll interval for scheduler loop (30 seconds)
const POLL_INTERVAL_SECS: u64 = 30;

/// How far either side of a scheduled time still counts as "now"
const DUE_WINDOW_SECS: i64 = 120;

/// Message sent to trigger workflow execution
#[derive(Debug, Clone)]
pub struct SchedulerMessage {
    pub workflow: WorkflowId,
    pub trigger: ExecutionTrigger,
}

/// Scheduler for managing workflow execution times
pub struct Scheduler {
    state: Arc<AppState>,
    sender: mpsc::Sender<SchedulerMessage>,
}

impl Scheduler {
    pub fn new(state: Arc<AppState>, sender: mpsc::Sender<SchedulerMessage>) -> Self {
        Self { state, sender }
    }

    /// Start the scheduler loop
    ///
    /// This runs indefinitely, checking for due jobs every poll interval.
    pub async fn run(&self) {
        for workflow in WorkflowId::ALL {
            let entry = self.state.config.schedules.entry(workflow);
            if !entry.enabled {
                log::info!("Scheduler: {} is disabled", workflow.as_str());
                continue;
            }
            match next_run_time(entry, self.state.schedule_timezone(entry), Utc::now()) {
                Ok(next) => log::info!("Scheduler: next {} run at {}", workflow.as_str(), next),
                Err(e) => log::warn!("Scheduler: {} has no upcoming run: {}", workflow.as_str(), e),
            }
        }

        let mut last_check = Utc::now();

        loop {
            tokio::time::sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;

            let now = Utc::now();

            let time_jump = (now - last_check).num_seconds();
            if time_jump > TIME_JUMP_THRESHOLD_SECS {
                log::info!(
                    "Scheduler: time jumped {} seconds, checking for missed jobs",
                    time_jump
                );
                self.check_missed_jobs(now).await;
            }

            self.check_and_run_due_jobs(now).await;

            last_check = now;
        }
    }

    /// Check for jobs that should run now
    async fn check_and_run_due_jobs(&self, now: DateTime<Utc>) {
        for workflow in WorkflowId::ALL {
            let entry = self.state.config.schedules.entry(workflow);
            if !entry.enabled {
                continue;
            }

            let tz = self.state.schedule_timezone(entry);
            let last_run = self.state.get_last_scheduled_run(workflow);
            match due_time(entry, tz, now, last_run) {
                Ok(Some(scheduled)) => {
                    self.trigger_workflow(workflow, ExecutionTrigger::Scheduled, scheduled)
                        .await;
                }
                Ok(None) => {}
                Err(e) => log::warn!("Scheduler: skipping {}: {}", workflow.as_str(), e),
            }
        }
    }

    /// Check for jobs that were missed while the process was not polling
    async fn check_missed_jobs(&self, now: DateTime<Utc>) {
        for workflow in WorkflowId::ALL {
            let entry = self.state.config.schedules.entry(workflow);
            if !entry.enabled {
                continue;
            }

            let tz = self.state.schedule_timezone(entry);
            let last_run = self.state.get_last_scheduled_run(workflow);
            if let Ok(Some(missed)) = find_missed_job(entry, tz, now, last_run) {
                log::info!(
                    "Scheduler: found missed '{}' job from {}, running now",
                    workflow.as_str(),
                    missed
                );
                self.trigger_workflow(workflow, ExecutionTrigger::Missed, missed)
                    .await;
            }
        }
    }

    /// Trigger a workflow execution
    async fn trigger_workflow(
        &self,
        workflow: WorkflowId,
        trigger: ExecutionTrigger,
        scheduled: DateTime<Utc>,
    ) {
        // Recorded before sending so the next poll inside the due window does
        // not fire the same slot again.
        self.state.set_last_scheduled_run(workflow, scheduled);

        if self
            .sender
            .send(SchedulerMessage { workflow, trigger })
            .await
            .is_err()
        {
            log::error!("Failed to send scheduler message for {:?}", workflow);
        }
    }
}

/// Parse a cron expression
pub fn parse_cron(expr: &str) -> Result<Schedule, ExecutionError> {
    // The cron crate expects 6 fields (with seconds), but we use 5-field format
    // Add "0" for seconds at the start
    let full_expr = format!("0 {}", expr);

    full_expr.parse::<Schedule>().map_err(|e| {
        ExecutionError::ConfigurationError(format!("Invalid cron expression '{}': {}", expr, e))
    })
}

/// The scheduled time to fire at `now`, if any.
///
/// A slot is due when `now` is within two minutes of it and it has not been
/// recorded as run.
pub fn due_time(
    entry: &ScheduleEntry,
    tz: Tz,
    now: DateTime<Utc>,
    last_run: Option<DateTime<Utc>>,
) -> Result<Option<DateTime<Utc>>, ExecutionError> {
    let schedule = parse_cron(&entry.cron)?;
    let now_local = now.with_timezone(&tz);

    let Some(next_time) = schedule
        .after(&(now_local - chrono::Duration::seconds(DUE_WINDOW_SECS)))
        .next()
    else {
        return Ok(None);
    };

    let next_utc = next_time.with_timezone(&Utc);
    if (now - next_utc).num_seconds().abs() >= DUE_WINDOW_SECS {
        return Ok(None);
    }

    if let Some(last) = last_run {
        if (last - next_utc).num_seconds().abs() < 60 {
            return Ok(None);
        }
    }

    Ok(Some(next_utc))
}

/// Find the earliest scheduled time inside the grace period that has not run.
pub fn find_missed_job(
    entry: &ScheduleEntry,
    tz: Tz,
    now: DateTime<Utc>,
    last_run: Option<DateTime<Utc>>,
) -> Result<Option<DateTime<Utc>>, ExecutionError> {
    let schedule = parse_cron(&entry.cron)?;
    let grace_start =
        now.with_timezone(&tz) - chrono::Duration::seconds(MISSED_JOB_GRACE_PERIOD_SECS);

    for scheduled in schedule.after(&grace_start) {
        let scheduled_utc = scheduled.with_timezone(&Utc);

        if scheduled_utc > now {
            break;
        }

        if let Some(last) = last_run {
            if last >= scheduled_utc {
                continue;
            }
        }

        return Ok(Some(scheduled_utc));
    }

    Ok(None)
}

/// Get the next scheduled time for a workflow
pub fn next_run_time(
    entry: &ScheduleEntry,
    tz: Tz,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ExecutionError> {
    let schedule = parse_cron(&entry.cron)?;
    let next = schedule.after(&now.with_timezone(&tz)).next().ok_or_else(|| {
        ExecutionError::ConfigurationError("No upcoming scheduled time".to_string())
    })?;

    Ok(next.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::Pacific::Auckland;

    use super::*;

    fn at(d: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Auckland
            .with_ymd_and_hms(2026, 10, d, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_parse_cron_weekdays_7pm() {
        assert!(parse_cron("0 19 * * Mon-Fri").is_ok());
    }

    #[test]
    fn test_parse_cron_invalid() {
        assert!(parse_cron("not a cron").is_err());
    }

    #[test]
    fn due_within_window_of_scheduled_time() {
        let entry = ScheduleEntry::default_timesheets();

        // Wednesday 19:00:30
        let now = at(14, 19, 0) + chrono::Duration::seconds(30);
        assert_eq!(due_time(&entry, Auckland, now, None).unwrap(), Some(at(14, 19, 0)));

        // An hour later is no longer due
        assert_eq!(due_time(&entry, Auckland, at(14, 20, 0), None).unwrap(), None);
    }

    #[test]
    fn not_due_twice_for_the_same_slot() {
        let entry = ScheduleEntry::default_timesheets();
        let now = at(14, 19, 1);
        assert_eq!(
            due_time(&entry, Auckland, now, Some(at(14, 19, 0))).unwrap(),
            None
        );
    }

    #[test]
    fn weekday_schedule_is_not_due_on_saturday() {
        let entry = ScheduleEntry::default_timesheets();
        assert_eq!(due_time(&entry, Auckland, at(17, 19, 0), None).unwrap(), None);
    }

    #[test]
    fn missed_job_inside_grace_period() {
        let entry = ScheduleEntry::default_timesheets();

        let missed = find_missed_job(&entry, Auckland, at(14, 20, 30), None).unwrap();
        assert_eq!(missed, Some(at(14, 19, 0)));

        // Already ran
        let missed = find_missed_job(&entry, Auckland, at(14, 20, 30), Some(at(14, 19, 0)));
        assert_eq!(missed.unwrap(), None);

        // Outside the grace period
        let missed = find_missed_job(&entry, Auckland, at(14, 23, 0), None).unwrap();
        assert_eq!(missed, None);
    }

    #[test]
    fn next_billable_run_is_friday_afternoon() {
        let entry = ScheduleEntry::default_billable();
        let next = next_run_time(&entry, Auckland, at(14, 9, 0)).unwrap();
        assert_eq!(next, at(16, 16, 0));
    }
}
