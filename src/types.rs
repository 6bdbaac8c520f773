use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::harvest::HarvestConfig;
use crate::slack::SlackConfig;

/// Main configuration loaded from ~/.timenag/config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    /// IANA timezone used for "now", the reporting day and cron schedules.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub slack: SlackConfig,
    pub harvest: HarvestConfig,
    /// Public holidays as `DD-MM-YYYY`.
    #[serde(default)]
    pub holidays: Vec<String>,
    #[serde(default)]
    pub schedules: Schedules,
    #[serde(default)]
    pub timesheets: TimesheetSettings,
    #[serde(default)]
    pub billable: BillableSettings,
}

fn default_port() -> u16 {
    3000
}

fn default_timezone() -> String {
    "Pacific/Auckland".to_string()
}

/// Settings for the timesheet-nag workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetSettings {
    /// Hour of day (local) after which today's timesheet is expected.
    #[serde(default = "default_deadline_hour")]
    pub deadline_hour: u32,
    #[serde(default = "default_timesheet_throttle_ms")]
    pub throttle_ms: u64,
}

fn default_deadline_hour() -> u32 {
    19
}

fn default_timesheet_throttle_ms() -> u64 {
    200
}

impl Default for TimesheetSettings {
    fn default() -> Self {
        Self {
            deadline_hour: default_deadline_hour(),
            throttle_ms: default_timesheet_throttle_ms(),
        }
    }
}

/// Settings for the billable-percentage workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillableSettings {
    #[serde(default = "default_billable_throttle_ms")]
    pub throttle_ms: u64,
}

fn default_billable_throttle_ms() -> u64 {
    500
}

impl Default for BillableSettings {
    fn default() -> Self {
        Self {
            throttle_ms: default_billable_throttle_ms(),
        }
    }
}

/// Schedule configuration for both workflows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedules {
    #[serde(default = "ScheduleEntry::default_timesheets")]
    pub timesheets: ScheduleEntry,
    #[serde(default = "ScheduleEntry::default_billable")]
    pub billable: ScheduleEntry,
}

impl Default for Schedules {
    fn default() -> Self {
        Self {
            timesheets: ScheduleEntry::default_timesheets(),
            billable: ScheduleEntry::default_billable(),
        }
    }
}

impl Schedules {
    pub fn entry(&self, workflow: WorkflowId) -> &ScheduleEntry {
        match workflow {
            WorkflowId::Timesheets => &self.timesheets,
            WorkflowId::Billable => &self.billable,
        }
    }
}

/// A single schedule entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub enabled: bool,
    pub cron: String,
    /// Overrides `Config::timezone` for this schedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl ScheduleEntry {
    /// Default schedule for the nag: 7 PM weekdays, right at the deadline
    pub fn default_timesheets() -> Self {
        Self {
            enabled: true,
            cron: "0 19 * * Mon-Fri".to_string(),
            timezone: None,
        }
    }

    /// Default schedule for the billable report: 4 PM Fridays
    pub fn default_billable() -> Self {
        Self {
            enabled: true,
            cron: "0 16 * * Fri".to_string(),
            timezone: None,
        }
    }
}

/// Workflow identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowId {
    Timesheets,
    Billable,
}

impl WorkflowId {
    pub const ALL: [WorkflowId; 2] = [WorkflowId::Timesheets, WorkflowId::Billable];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowId::Timesheets => "timesheets",
            WorkflowId::Billable => "billable",
        }
    }
}

/// What triggered the execution
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionTrigger {
    Scheduled,
    Manual,
    Missed,
}

// =============================================================================
// Reconciliation model
// =============================================================================

/// A member of the chat workspace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAccount {
    pub id: String,
    /// Handle used when mentioning the member.
    pub name: String,
    pub display_name: String,
    pub email: Option<String>,
    pub is_deleted: bool,
}

/// A person in the time-tracking service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingAccount {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_contractor: bool,
}

/// A person present and eligible on both sides, joined by email.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedUser {
    pub tracking_account: TrackingAccount,
    pub chat_account: ChatAccount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    pub name: String,
    /// Most recent time entry recorded against the project, if Harvest knows it.
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub owner_id: u64,
    pub hours: f64,
    pub billable: bool,
    pub date: NaiveDate,
}

/// Inclusive calendar-date range passed to entry queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl ReportingWindow {
    pub fn single_day(day: NaiveDate) -> Self {
        Self { from: day, to: day }
    }
}

/// Outcome for one subject (a linked user or a project).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult<S> {
    pub subject: S,
    pub entries: Vec<TimeEntry>,
    pub flagged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetrics {
    pub total_hours: f64,
    pub billable_hours: f64,
    pub non_billable_hours: f64,
    /// 0..=1; 0 when no hours were logged.
    pub billable_percentage: f64,
    /// Whole percent, rounded up.
    pub billable_percentage_rounded: u32,
    /// False when no hours were logged at all.
    pub has_data: bool,
}

// =============================================================================
// Workflow reports
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetReport {
    pub reporting_day: NaiveDate,
    pub is_holiday: bool,
    /// Linked users whose entries were fetched successfully.
    pub checked: usize,
    pub flagged: Vec<LinkedUser>,
    pub notified: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillableReport {
    pub window: ReportingWindow,
    /// Projects with activity inside the window.
    pub projects_considered: usize,
    /// Projects with at least one entry, billable or not.
    pub projects_reporting: usize,
    pub metrics: AggregateMetrics,
    pub notified: bool,
}

/// Result of one workflow run, as returned to HTTP callers.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WorkflowOutcome {
    Timesheets(TimesheetReport),
    Billable(BillableReport),
}
