//! Workflow definitions
//!
//! Each workflow is a pipeline over injected clients:
//! - Timesheets: day of interest -> linked users -> staggered entry fetch -> nag
//! - Billable: week window -> active projects -> staggered partition fetch -> percentage

pub mod billable;
pub mod timesheets;

use chrono::{DateTime, Utc};

use crate::error::ExecutionError;
use crate::harvest::client::HarvestClient;
use crate::harvest::TimeTracker;
use crate::identity;
use crate::slack::client::SlackClient;
use crate::slack::ChatPlatform;
use crate::state::AppState;
use crate::types::{Config, ExecutionTrigger, LinkedUser, WorkflowId, WorkflowOutcome};

/// Builds fresh upstream clients for each run.
pub trait Connector: Send + Sync {
    fn chat(&self, config: &Config) -> Box<dyn ChatPlatform>;
    fn tracker(&self, config: &Config) -> Box<dyn TimeTracker>;
}

/// Connects to the real Slack and Harvest APIs.
pub struct LiveConnector;

impl Connector for LiveConnector {
    fn chat(&self, config: &Config) -> Box<dyn ChatPlatform> {
        let client = match &config.slack.api_url {
            Some(url) => SlackClient::with_api_url(&config.slack.api_token, url),
            None => SlackClient::new(&config.slack.api_token),
        };
        Box::new(client)
    }

    fn tracker(&self, config: &Config) -> Box<dyn TimeTracker> {
        Box::new(HarvestClient::new(&config.harvest))
    }
}

/// Fetch both user lists together and join them.
pub async fn linked_users(
    state: &AppState,
    chat: &dyn ChatPlatform,
    tracker: &dyn TimeTracker,
) -> Result<Vec<LinkedUser>, ExecutionError> {
    let (chat_accounts, tracking_accounts) =
        tokio::try_join!(chat.list_users(), tracker.list_people())?;

    let linked = identity::join(&chat_accounts, &tracking_accounts, &state.excluded);
    log::info!(
        "Linked {} of {} Harvest people to Slack members",
        linked.len(),
        tracking_accounts.len()
    );
    Ok(linked)
}

/// Linked users, with clients from the state's connector.
pub async fn list_linked_users(state: &AppState) -> Result<Vec<LinkedUser>, ExecutionError> {
    let chat = state.connector().chat(&state.config);
    let tracker = state.connector().tracker(&state.config);
    linked_users(state, chat.as_ref(), tracker.as_ref()).await
}

/// Run one workflow to completion, guarded against overlapping runs.
pub async fn execute(
    state: &AppState,
    workflow: WorkflowId,
    trigger: ExecutionTrigger,
    now: DateTime<Utc>,
) -> Result<WorkflowOutcome, ExecutionError> {
    let _guard = state.try_begin_run(workflow)?;
    log::info!(
        "Executing workflow {} (trigger: {:?})",
        workflow.as_str(),
        trigger
    );

    let chat = state.connector().chat(&state.config);
    let tracker = state.connector().tracker(&state.config);

    match workflow {
        WorkflowId::Timesheets => timesheets::run(state, chat.as_ref(), tracker.as_ref(), now)
            .await
            .map(WorkflowOutcome::Timesheets),
        WorkflowId::Billable => billable::run(state, chat.as_ref(), tracker.as_ref(), now)
            .await
            .map(WorkflowOutcome::Billable),
    }
}
