//! REST client for the Harvest v1 API.
//!
//! Uses reqwest with basic auth (account email + password) and asks for JSON
//! on every request. Harvest wraps each record in a single-key object
//! (`{"user": {..}}`, `{"project": {..}}`, `{"day_entry": {..}}`).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::deadline::format_query_date;
use crate::error::{status_error, ExecutionError};
use crate::harvest::{reports, HarvestConfig, TimeTracker};
use crate::types::{Project, ReportingWindow, TimeEntry, TrackingAccount};

const SERVICE: &str = "Harvest";

#[derive(Debug, Deserialize)]
struct PersonRecord {
    user: Person,
}

#[derive(Debug, Deserialize)]
struct Person {
    id: u64,
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    is_active: bool,
    #[serde(default)]
    is_contractor: bool,
}

impl From<Person> for TrackingAccount {
    fn from(p: Person) -> Self {
        TrackingAccount {
            id: p.id,
            email: p.email,
            first_name: p.first_name,
            last_name: p.last_name,
            is_active: p.is_active,
            is_contractor: p.is_contractor,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProjectRecord {
    project: ProjectBody,
}

#[derive(Debug, Deserialize)]
struct ProjectBody {
    id: u64,
    name: String,
    #[serde(default)]
    hint_latest_record_at: Option<String>,
}

impl From<ProjectBody> for Project {
    fn from(p: ProjectBody) -> Self {
        Project {
            id: p.id,
            name: p.name,
            last_activity: p.hint_latest_record_at.as_deref().and_then(parse_activity),
        }
    }
}

/// Harvest reports `hint_latest_record_at` either as a date or a timestamp.
fn parse_activity(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[derive(Debug, Deserialize)]
struct DayEntryRecord {
    day_entry: DayEntry,
}

#[derive(Debug, Deserialize)]
struct DayEntry {
    user_id: u64,
    #[serde(default)]
    hours: f64,
    spent_at: NaiveDate,
}

impl DayEntry {
    fn into_entry(self, billable: bool) -> TimeEntry {
        TimeEntry {
            owner_id: self.user_id,
            hours: self.hours,
            billable,
            date: self.spent_at,
        }
    }
}

pub struct HarvestClient {
    client: reqwest::Client,
    base_url: String,
    email: String,
    password: String,
}

impl HarvestClient {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_base(),
            email: config.email.clone(),
            password: config.password.clone(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ExecutionError> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .basic_auth(&self.email, Some(&self.password))
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(SERVICE, status, body));
        }

        resp.json::<T>()
            .await
            .map_err(|e| ExecutionError::MalformedResponse(format!("{} {}: {}", SERVICE, path, e)))
    }

    async fn day_entries(
        &self,
        path: &str,
        query: &[(&str, String)],
        billable: bool,
    ) -> Result<Vec<TimeEntry>, ExecutionError> {
        let records: Vec<DayEntryRecord> = self.get(path, query).await?;
        Ok(records
            .into_iter()
            .map(|r| r.day_entry.into_entry(billable))
            .collect())
    }
}

fn window_query(window: &ReportingWindow) -> Vec<(&'static str, String)> {
    vec![
        ("from", format_query_date(window.from)),
        ("to", format_query_date(window.to)),
    ]
}

#[async_trait]
impl TimeTracker for HarvestClient {
    async fn list_people(&self) -> Result<Vec<TrackingAccount>, ExecutionError> {
        let records: Vec<PersonRecord> = self.get("/people", &[]).await?;
        log::info!("Harvest: listed {} people", records.len());
        Ok(records.into_iter().map(|r| r.user.into()).collect())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ExecutionError> {
        let records: Vec<ProjectRecord> = self.get("/projects", &[]).await?;
        log::info!("Harvest: listed {} projects", records.len());
        Ok(records.into_iter().map(|r| r.project.into()).collect())
    }

    // Per-user entries carry no billable partition; only their presence matters.
    async fn entries_for_user(
        &self,
        user_id: u64,
        window: &ReportingWindow,
    ) -> Result<Vec<TimeEntry>, ExecutionError> {
        let path = format!("/people/{}/entries", user_id);
        self.day_entries(&path, &window_query(window), false).await
    }

    async fn entries_for_project(
        &self,
        project_id: u64,
        window: &ReportingWindow,
        billable: bool,
    ) -> Result<Vec<TimeEntry>, ExecutionError> {
        let path = reports::project_entries_path(project_id);
        self.day_entries(&path, &reports::project_query(window, billable), billable)
            .await
    }
}
