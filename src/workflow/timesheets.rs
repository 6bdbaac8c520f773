//! Timesheet nag: find linked users with nothing logged for the day of
//! interest and mention them in Slack.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::deadline::compute_reporting_day;
use crate::error::ExecutionError;
use crate::evaluate::{evaluate_users, flagged_subjects};
use crate::harvest::TimeTracker;
use crate::notification::{compose_nag_message, webhook_payload};
use crate::slack::ChatPlatform;
use crate::state::AppState;
use crate::throttle::{fetch_all, successes};
use crate::types::{ReportingWindow, TimesheetReport};

pub async fn run(
    state: &AppState,
    chat: &dyn ChatPlatform,
    tracker: &dyn TimeTracker,
    now: DateTime<Utc>,
) -> Result<TimesheetReport, ExecutionError> {
    let settings = &state.config.timesheets;
    let local_now = now.with_timezone(&state.timezone).naive_local();
    let reporting = compute_reporting_day(local_now, &state.calendar, settings.deadline_hour);

    if reporting.is_holiday {
        log::info!(
            "Timesheets: {} is a day off, not nagging anyone",
            reporting.day
        );
        return Ok(TimesheetReport {
            reporting_day: reporting.day,
            is_holiday: true,
            checked: 0,
            flagged: Vec::new(),
            notified: false,
        });
    }

    log::info!("Timesheets: fetching time entries for {}", reporting.day);

    let users = super::linked_users(state, chat, tracker).await?;
    let window = ReportingWindow::single_day(reporting.day);
    let throttle = Duration::from_millis(settings.throttle_ms);

    let results = fetch_all(users, throttle, |user, _| async move {
        log::info!(
            "Timesheets: fetching entries for {}",
            user.chat_account.display_name
        );
        let entries = tracker
            .entries_for_user(user.tracking_account.id, &window)
            .await?;
        Ok::<_, ExecutionError>((user, entries))
    })
    .await;

    let fetched = successes(results);
    let checked = fetched.len();
    let flagged = flagged_subjects(evaluate_users(fetched));

    let notified = if flagged.is_empty() {
        log::info!("Timesheets: all {} people are up to date", checked);
        false
    } else {
        let bot = &state.config.slack.timesheets;
        let payload = webhook_payload(compose_nag_message(&flagged, reporting.day), bot);
        chat.send_webhook_message(&bot.webhook, &payload).await?;
        log::info!("Timesheets: nagged {} of {} people", flagged.len(), checked);
        true
    };

    Ok(TimesheetReport {
        reporting_day: reporting.day,
        is_holiday: false,
        checked,
        flagged,
        notified,
    })
}
