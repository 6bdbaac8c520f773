//! Harvest integration: people, projects and time entries.
//!
//! The `TimeTracker` trait is the seam the workflows depend on;
//! `client::HarvestClient` is the live implementation and `reports` holds the
//! per-project queries built on top of it.

pub mod client;
pub mod reports;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;
use crate::types::{Project, ReportingWindow, TimeEntry, TrackingAccount};

/// Harvest configuration stored in ~/.timenag/config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestConfig {
    pub subdomain: String,
    pub email: String,
    pub password: String,
    /// People who are never nagged, by Harvest email.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Overrides `https://{subdomain}.harvestapp.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl HarvestConfig {
    pub fn api_base(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.harvestapp.com", self.subdomain),
        }
    }
}

/// The time-tracking side of the reconciliation.
#[async_trait]
pub trait TimeTracker: Send + Sync {
    async fn list_people(&self) -> Result<Vec<TrackingAccount>, ExecutionError>;

    async fn list_projects(&self) -> Result<Vec<Project>, ExecutionError>;

    async fn entries_for_user(
        &self,
        user_id: u64,
        window: &ReportingWindow,
    ) -> Result<Vec<TimeEntry>, ExecutionError>;

    /// Entries logged against a project, restricted to one billable partition.
    ///
    /// Every returned entry carries `billable` as requested.
    async fn entries_for_project(
        &self,
        project_id: u64,
        window: &ReportingWindow,
        billable: bool,
    ) -> Result<Vec<TimeEntry>, ExecutionError>;
}
