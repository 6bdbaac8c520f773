//! Workflow execution engine
//!
//! Receives trigger messages from the scheduler and runs each workflow to
//! completion. A failed run is logged and never stops the loop.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;

use crate::error::ExecutionError;
use crate::scheduler::SchedulerMessage;
use crate::state::AppState;
use crate::types::{ExecutionTrigger, WorkflowId, WorkflowOutcome};
use crate::workflow;

/// Executor manages workflow execution
pub struct Executor {
    state: Arc<AppState>,
}

impl Executor {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Start the executor loop
    ///
    /// Listens for workflow execution requests until every sender is dropped.
    pub async fn run(&self, mut receiver: mpsc::Receiver<SchedulerMessage>) {
        while let Some(msg) = receiver.recv().await {
            self.execute_workflow(msg.workflow, msg.trigger).await;
        }
        log::info!("Executor: scheduler channel closed, stopping");
    }

    /// Execute a workflow and log how it went
    pub async fn execute_workflow(&self, workflow: WorkflowId, trigger: ExecutionTrigger) {
        match workflow::execute(&self.state, workflow, trigger, Utc::now()).await {
            Ok(outcome) => log_outcome(&outcome),
            Err(ExecutionError::AlreadyRunning(_)) => {
                log::info!("Workflow {} already running, skipping", workflow.as_str());
            }
            Err(e) if e.is_retryable() => log::warn!(
                "Workflow {} hit a transient failure, next scheduled run will retry: {} ({})",
                workflow.as_str(),
                e,
                e.recovery_suggestion()
            ),
            Err(e) => log::error!(
                "Workflow {} failed: {} ({})",
                workflow.as_str(),
                e,
                e.recovery_suggestion()
            ),
        }
    }
}

fn log_outcome(outcome: &WorkflowOutcome) {
    match outcome {
        WorkflowOutcome::Timesheets(report) if report.is_holiday => {
            log::info!("Timesheets: skipped, {} is a day off", report.reporting_day);
        }
        WorkflowOutcome::Timesheets(report) => log::info!(
            "Timesheets: checked {} people for {}, {} flagged",
            report.checked,
            report.reporting_day,
            report.flagged.len()
        ),
        WorkflowOutcome::Billable(report) => log::info!(
            "Billable: {}% across {} projects",
            report.metrics.billable_percentage_rounded,
            report.projects_reporting
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_config, FakeChat, FakeConnector, FakeTracker};
    use crate::types::Project;

    #[tokio::test(start_paused = true)]
    async fn runs_each_message_and_survives_failures() {
        let connector = FakeConnector {
            chat: FakeChat::default().failing_with(|| {
                ExecutionError::MalformedResponse("users.list returned ok: false".to_string())
            }),
            tracker: FakeTracker::default().with_projects(vec![Project {
                id: 1,
                name: "Site".to_string(),
                last_activity: None,
            }]),
        };
        let tracker = connector.tracker.clone();
        let state =
            Arc::new(AppState::with_connector(test_config(), Box::new(connector)).unwrap());
        let executor = Executor::new(state.clone());

        let (tx, rx) = mpsc::channel(4);
        for workflow in [WorkflowId::Timesheets, WorkflowId::Billable] {
            tx.send(SchedulerMessage {
                workflow,
                trigger: ExecutionTrigger::Scheduled,
            })
            .await
            .unwrap();
        }
        drop(tx);

        executor.run(rx).await;

        // The billable run still happened after whatever the nag run did
        assert!(tracker
            .recorded_queries()
            .iter()
            .any(|(kind, id, _)| *kind == "project" && *id == 1));
        assert!(!state.is_running(WorkflowId::Timesheets));
        assert!(!state.is_running(WorkflowId::Billable));
    }
}
