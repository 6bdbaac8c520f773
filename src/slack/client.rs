//! Web API client for Slack.
//!
//! Uses reqwest with Bearer token auth for `users.list` and plain JSON POSTs
//! for incoming webhooks.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{status_error, ExecutionError};
use crate::notification::WebhookPayload;
use crate::slack::ChatPlatform;
use crate::types::ChatAccount;

const SLACK_API_URL: &str = "https://slack.com/api";
const SERVICE: &str = "Slack";

/// Members per `users.list` page.
const PAGE_LIMIT: u32 = 200;

/// Error codes Slack reports with `ok: false` when the token is unusable.
const AUTH_ERRORS: &[&str] = &[
    "not_authed",
    "invalid_auth",
    "account_inactive",
    "token_revoked",
    "token_expired",
];

#[derive(Debug, Deserialize)]
struct UsersListResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct Member {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    real_name: Option<String>,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    profile: Profile,
}

#[derive(Debug, Default, Deserialize)]
struct Profile {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    real_name: Option<String>,
}

impl From<Member> for ChatAccount {
    fn from(m: Member) -> Self {
        let display_name = m
            .real_name
            .or(m.profile.real_name)
            .unwrap_or_else(|| m.name.clone());
        ChatAccount {
            id: m.id,
            name: m.name,
            display_name,
            email: m.profile.email,
            is_deleted: m.deleted,
        }
    }
}

/// Classify a `users.list` body that came back with `ok: false`.
fn api_error(error: Option<String>) -> ExecutionError {
    let code = error.unwrap_or_else(|| "unknown_error".to_string());
    if AUTH_ERRORS.contains(&code.as_str()) {
        ExecutionError::UpstreamAuth { service: SERVICE }
    } else if code == "ratelimited" {
        ExecutionError::ApiRateLimit
    } else {
        ExecutionError::MalformedResponse(format!("users.list returned ok: false ({})", code))
    }
}

pub struct SlackClient {
    client: reqwest::Client,
    api_token: String,
    api_url: String,
}

impl SlackClient {
    pub fn new(api_token: &str) -> Self {
        Self::with_api_url(api_token, SLACK_API_URL)
    }

    pub fn with_api_url(api_token: &str, api_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_token: api_token.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn users_page(&self, cursor: Option<&str>) -> Result<UsersListResponse, ExecutionError> {
        let mut query = vec![("limit", PAGE_LIMIT.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }

        let resp = self
            .client
            .get(format!("{}/users.list", self.api_url))
            .bearer_auth(&self.api_token)
            .query(&query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(SERVICE, status, body));
        }

        let page: UsersListResponse = resp.json().await?;
        if !page.ok {
            return Err(api_error(page.error));
        }
        Ok(page)
    }
}

#[async_trait]
impl ChatPlatform for SlackClient {
    async fn list_users(&self) -> Result<Vec<ChatAccount>, ExecutionError> {
        let mut accounts = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.users_page(cursor.as_deref()).await?;
            accounts.extend(page.members.into_iter().map(ChatAccount::from));

            cursor = page
                .response_metadata
                .map(|m| m.next_cursor)
                .filter(|c| !c.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        log::info!("Slack: listed {} members", accounts.len());
        Ok(accounts)
    }

    async fn send_webhook_message(
        &self,
        webhook_url: &str,
        payload: &WebhookPayload,
    ) -> Result<(), ExecutionError> {
        log::info!("Posting to Slack channel {}", payload.channel);

        let resp = self.client.post(webhook_url).json(payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(SERVICE, status, body));
        }
        Ok(())
    }
}
