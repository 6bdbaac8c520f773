//! Billable percentage: share of this week's hours that are billable, across
//! projects with recent activity.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::accumulate::accumulate;
use crate::deadline::week_to_date;
use crate::error::ExecutionError;
use crate::evaluate::{active_in_window, evaluate_projects};
use crate::harvest::{reports, TimeTracker};
use crate::notification::{compose_percentage_message, webhook_payload};
use crate::slack::ChatPlatform;
use crate::state::AppState;
use crate::throttle::{fetch_all, successes};
use crate::types::BillableReport;

pub async fn run(
    state: &AppState,
    chat: &dyn ChatPlatform,
    tracker: &dyn TimeTracker,
    now: DateTime<Utc>,
) -> Result<BillableReport, ExecutionError> {
    let today = now.with_timezone(&state.timezone).date_naive();
    let window = week_to_date(today);

    let projects = tracker.list_projects().await?;
    let total_projects = projects.len();
    let active = active_in_window(projects, &window, state.timezone);
    let projects_considered = active.len();
    log::info!(
        "Billable: {} of {} projects active since {}",
        projects_considered,
        total_projects,
        window.from
    );

    let throttle = Duration::from_millis(state.config.billable.throttle_ms);
    let results = fetch_all(active, throttle, |project, _| {
        reports::project_entries(tracker, project, window)
    })
    .await;

    let evaluated = evaluate_projects(successes(results));
    let projects_reporting = evaluated.len();
    let metrics = accumulate(&evaluated);

    let notified = if metrics.has_data {
        let bot = &state.config.slack.billable;
        let text = compose_percentage_message(metrics.billable_percentage_rounded);
        chat.send_webhook_message(&bot.webhook, &webhook_payload(text, bot))
            .await?;
        log::info!(
            "Billable: {:.2} of {:.2} hours billable ({}%)",
            metrics.billable_hours,
            metrics.total_hours,
            metrics.billable_percentage_rounded
        );
        true
    } else {
        log::info!("Billable: no hours logged since {}, not posting", window.from);
        false
    };

    Ok(BillableReport {
        window,
        projects_considered,
        projects_reporting,
        metrics,
        notified,
    })
}
