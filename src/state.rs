use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;

use crate::deadline::HolidayCalendar;
use crate::error::ExecutionError;
use crate::types::{Config, ScheduleEntry, WorkflowId};
use crate::workflow::{Connector, LiveConnector};

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "TIMENAG_CONFIG";

/// Upper bound for either workflow's stagger interval (one minute)
pub const MAX_THROTTLE_MS: u64 = 60_000;

/// Process-wide state shared by the scheduler, executor and HTTP handlers.
///
/// Everything except the run guards and scheduler bookkeeping is read-only
/// after startup.
pub struct AppState {
    pub config: Config,
    pub timezone: Tz,
    pub calendar: HolidayCalendar,
    pub excluded: HashSet<String>,
    connector: Box<dyn Connector>,
    running: Mutex<HashSet<WorkflowId>>,
    last_scheduled_run: Mutex<HashMap<WorkflowId, DateTime<Utc>>>,
}

impl AppState {
    /// Validate the config and build state that talks to the real Slack and Harvest.
    pub fn new(config: Config) -> Result<Self, ExecutionError> {
        Self::with_connector(config, Box::new(LiveConnector))
    }

    pub fn with_connector(
        config: Config,
        connector: Box<dyn Connector>,
    ) -> Result<Self, ExecutionError> {
        let timezone = parse_timezone(&config.timezone)?;
        let calendar = HolidayCalendar::parse(&config.holidays)?;

        for workflow in WorkflowId::ALL {
            let entry = config.schedules.entry(workflow);
            crate::scheduler::parse_cron(&entry.cron)?;
            if let Some(tz) = &entry.timezone {
                parse_timezone(tz)?;
            }
        }

        if config.timesheets.deadline_hour > 23 {
            return Err(ExecutionError::ConfigurationError(format!(
                "deadlineHour must be 0-23, got {}",
                config.timesheets.deadline_hour
            )));
        }

        for (name, throttle_ms) in [
            ("timesheets", config.timesheets.throttle_ms),
            ("billable", config.billable.throttle_ms),
        ] {
            if throttle_ms > MAX_THROTTLE_MS {
                return Err(ExecutionError::ConfigurationError(format!(
                    "{}.throttleMs must be at most {}, got {}",
                    name, MAX_THROTTLE_MS, throttle_ms
                )));
            }
        }

        let excluded = config.harvest.exclude.iter().cloned().collect();

        log::info!(
            "Loaded config: timezone {}, {} holidays, {} excluded people",
            timezone,
            calendar.len(),
            config.harvest.exclude.len()
        );

        Ok(Self {
            config,
            timezone,
            calendar,
            excluded,
            connector,
            running: Mutex::new(HashSet::new()),
            last_scheduled_run: Mutex::new(HashMap::new()),
        })
    }

    pub fn connector(&self) -> &dyn Connector {
        self.connector.as_ref()
    }

    /// Claim the in-flight slot for a workflow.
    ///
    /// Fails with `AlreadyRunning` while another run of the same workflow holds
    /// the guard. The slot is released when the guard drops.
    pub fn try_begin_run(&self, workflow: WorkflowId) -> Result<RunGuard<'_>, ExecutionError> {
        if !self.running.lock().insert(workflow) {
            return Err(ExecutionError::AlreadyRunning(workflow));
        }
        Ok(RunGuard {
            state: self,
            workflow,
        })
    }

    pub fn is_running(&self, workflow: WorkflowId) -> bool {
        self.running.lock().contains(&workflow)
    }

    /// Timezone a schedule fires in
    pub fn schedule_timezone(&self, entry: &ScheduleEntry) -> Tz {
        entry
            .timezone
            .as_deref()
            .and_then(|tz| tz.parse().ok())
            .unwrap_or(self.timezone)
    }

    /// Record when a scheduled run last occurred
    pub fn set_last_scheduled_run(&self, workflow: WorkflowId, time: DateTime<Utc>) {
        self.last_scheduled_run.lock().insert(workflow, time);
    }

    pub fn get_last_scheduled_run(&self, workflow: WorkflowId) -> Option<DateTime<Utc>> {
        self.last_scheduled_run.lock().get(&workflow).copied()
    }
}

/// Holds a workflow's in-flight slot until dropped.
pub struct RunGuard<'a> {
    state: &'a AppState,
    workflow: WorkflowId,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.running.lock().remove(&self.workflow);
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, ExecutionError> {
    name.parse()
        .map_err(|_| ExecutionError::ConfigurationError(format!("Invalid timezone: {}", name)))
}

/// Get the config file path: `$TIMENAG_CONFIG`, else ~/.timenag/config.json
pub fn config_path() -> Result<PathBuf, ExecutionError> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let home = dirs::home_dir().ok_or_else(|| {
        ExecutionError::ConfigurationError("Could not find home directory".to_string())
    })?;
    Ok(home.join(".timenag").join("config.json"))
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> Result<Config, ExecutionError> {
    if !path.exists() {
        return Err(ExecutionError::ConfigurationError(format!(
            "Config file not found at {}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| ExecutionError::ParseError(format!("{}: {}", path.display(), e)))
}
