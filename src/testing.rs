//! In-memory Slack and Harvest doubles for workflow and server tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::error::ExecutionError;
use crate::harvest::{HarvestConfig, TimeTracker};
use crate::notification::WebhookPayload;
use crate::slack::{BotConfig, ChatPlatform, SlackConfig};
use crate::types::{
    ChatAccount, Config, Project, ReportingWindow, TimeEntry, TrackingAccount,
};
use crate::workflow::Connector;

pub fn entry(owner_id: u64, hours: f64, billable: bool) -> TimeEntry {
    TimeEntry {
        owner_id,
        hours,
        billable,
        date: NaiveDate::from_ymd_opt(2026, 10, 13).unwrap(),
    }
}

pub fn chat_account(id: &str, name: &str, email: &str) -> ChatAccount {
    ChatAccount {
        id: id.to_string(),
        name: name.to_string(),
        display_name: name.to_string(),
        email: Some(email.to_string()),
        is_deleted: false,
    }
}

pub fn person(id: u64, email: &str) -> TrackingAccount {
    TrackingAccount {
        id,
        email: email.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        is_active: true,
        is_contractor: false,
    }
}

fn bot(name: &str) -> BotConfig {
    BotConfig {
        webhook: format!("https://hooks.slack.test/{}", name),
        bot_name: name.to_string(),
        bot_emoji: ":clock1:".to_string(),
        channel: "#general".to_string(),
    }
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        timezone: "Pacific/Auckland".to_string(),
        slack: SlackConfig {
            api_token: "xoxb-test".to_string(),
            timesheets: bot("timesheets"),
            billable: bot("billable"),
            api_url: None,
        },
        harvest: HarvestConfig {
            subdomain: "acme".to_string(),
            email: "ops@acme.test".to_string(),
            password: "secret".to_string(),
            exclude: vec!["boss@x.com".to_string()],
            base_url: None,
        },
        holidays: vec!["26-10-2026".to_string()],
        schedules: Default::default(),
        timesheets: Default::default(),
        billable: Default::default(),
    }
}

#[derive(Clone, Default)]
pub struct FakeChat {
    users: Vec<ChatAccount>,
    list_error: Option<fn() -> ExecutionError>,
    pub sent: Arc<Mutex<Vec<(String, WebhookPayload)>>>,
}

impl FakeChat {
    pub fn with_users(users: Vec<ChatAccount>) -> Self {
        Self {
            users,
            ..Default::default()
        }
    }

    pub fn failing_with(mut self, error: fn() -> ExecutionError) -> Self {
        self.list_error = Some(error);
        self
    }

    pub fn sent_messages(&self) -> Vec<(String, WebhookPayload)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl ChatPlatform for FakeChat {
    async fn list_users(&self) -> Result<Vec<ChatAccount>, ExecutionError> {
        match self.list_error {
            Some(error) => Err(error()),
            None => Ok(self.users.clone()),
        }
    }

    async fn send_webhook_message(
        &self,
        webhook_url: &str,
        payload: &WebhookPayload,
    ) -> Result<(), ExecutionError> {
        self.sent
            .lock()
            .push((webhook_url.to_string(), payload.clone()));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakeTracker {
    people: Vec<TrackingAccount>,
    projects: Vec<Project>,
    user_entries: HashMap<u64, Vec<TimeEntry>>,
    project_entries: HashMap<(u64, bool), Vec<TimeEntry>>,
    failing_users: HashSet<u64>,
    failing_projects: HashSet<u64>,
    /// Every entry query, as (kind, id, window).
    pub queries: Arc<Mutex<Vec<(&'static str, u64, ReportingWindow)>>>,
}

impl FakeTracker {
    pub fn with_people(mut self, people: Vec<TrackingAccount>) -> Self {
        self.people = people;
        self
    }

    pub fn with_projects(mut self, projects: Vec<Project>) -> Self {
        self.projects = projects;
        self
    }

    pub fn with_user_entries(mut self, user_id: u64, entries: Vec<TimeEntry>) -> Self {
        self.user_entries.insert(user_id, entries);
        self
    }

    pub fn with_project_entries(
        mut self,
        project_id: u64,
        billable: bool,
        entries: Vec<TimeEntry>,
    ) -> Self {
        self.project_entries.insert((project_id, billable), entries);
        self
    }

    pub fn failing_user(mut self, user_id: u64) -> Self {
        self.failing_users.insert(user_id);
        self
    }

    pub fn failing_project(mut self, project_id: u64) -> Self {
        self.failing_projects.insert(project_id);
        self
    }

    pub fn recorded_queries(&self) -> Vec<(&'static str, u64, ReportingWindow)> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl TimeTracker for FakeTracker {
    async fn list_people(&self) -> Result<Vec<TrackingAccount>, ExecutionError> {
        Ok(self.people.clone())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ExecutionError> {
        Ok(self.projects.clone())
    }

    async fn entries_for_user(
        &self,
        user_id: u64,
        window: &ReportingWindow,
    ) -> Result<Vec<TimeEntry>, ExecutionError> {
        self.queries.lock().push(("user", user_id, *window));
        if self.failing_users.contains(&user_id) {
            return Err(ExecutionError::NetworkError("connection reset".to_string()));
        }
        Ok(self.user_entries.get(&user_id).cloned().unwrap_or_default())
    }

    async fn entries_for_project(
        &self,
        project_id: u64,
        window: &ReportingWindow,
        billable: bool,
    ) -> Result<Vec<TimeEntry>, ExecutionError> {
        self.queries.lock().push(("project", project_id, *window));
        if self.failing_projects.contains(&project_id) && !billable {
            return Err(ExecutionError::ApiRateLimit);
        }
        Ok(self
            .project_entries
            .get(&(project_id, billable))
            .cloned()
            .unwrap_or_default())
    }
}

/// Hands out clones of the same fakes, so recorded calls are shared.
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub chat: FakeChat,
    pub tracker: FakeTracker,
}

impl Connector for FakeConnector {
    fn chat(&self, _config: &Config) -> Box<dyn ChatPlatform> {
        Box::new(self.chat.clone())
    }

    fn tracker(&self, _config: &Config) -> Box<dyn TimeTracker> {
        Box::new(self.tracker.clone())
    }
}
