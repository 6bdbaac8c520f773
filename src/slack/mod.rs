//! Slack integration: member directory and incoming webhooks.

pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;
use crate::notification::WebhookPayload;
use crate::types::ChatAccount;

/// Slack configuration stored in ~/.timenag/config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackConfig {
    pub api_token: String,
    pub timesheets: BotConfig,
    pub billable: BotConfig,
    /// Overrides `https://slack.com/api`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

/// Identity a workflow posts as, and where.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    pub webhook: String,
    pub bot_name: String,
    #[serde(default = "default_bot_emoji")]
    pub bot_emoji: String,
    pub channel: String,
}

fn default_bot_emoji() -> String {
    ":robot_face:".to_string()
}

/// The chat side of the reconciliation.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Every member of the workspace, deleted members included.
    async fn list_users(&self) -> Result<Vec<ChatAccount>, ExecutionError>;

    async fn send_webhook_message(
        &self,
        webhook_url: &str,
        payload: &WebhookPayload,
    ) -> Result<(), ExecutionError>;
}
