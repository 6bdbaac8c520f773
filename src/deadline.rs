//! Day-of-interest and reporting-window calculation.
//!
//! All functions take local wall-clock values; converting "now" into the
//! configured timezone is the caller's job.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::error::ExecutionError;
use crate::types::ReportingWindow;

const HOLIDAY_FORMAT: &str = "%d-%m-%Y";

/// Static public-holiday calendar, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Parse `DD-MM-YYYY` dates. A single malformed date rejects the whole list.
    pub fn parse<S: AsRef<str>>(dates: &[S]) -> Result<Self, ExecutionError> {
        let dates = dates
            .iter()
            .map(|raw| {
                let raw = raw.as_ref().trim();
                NaiveDate::parse_from_str(raw, HOLIDAY_FORMAT).map_err(|e| {
                    ExecutionError::ConfigurationError(format!(
                        "Invalid holiday '{}' (expected DD-MM-YYYY): {}",
                        raw, e
                    ))
                })
            })
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { dates })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// Weekends and listed public holidays.
    pub fn is_day_off(&self, date: NaiveDate) -> bool {
        is_weekend(date) || self.contains(date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The calendar day whose timesheets are checked, and whether the check is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingDay {
    pub day: NaiveDate,
    pub is_holiday: bool,
}

/// Work out which day's timesheets matter at `now`.
///
/// Before the deadline, people still have time to fill in today, so the check
/// looks at the previous business day instead. Monday rolls back to Friday.
pub fn compute_reporting_day(
    now: NaiveDateTime,
    calendar: &HolidayCalendar,
    deadline_hour: u32,
) -> ReportingDay {
    let today = now.date();

    if calendar.is_day_off(today) {
        return ReportingDay {
            day: today,
            is_holiday: true,
        };
    }

    let deadline = NaiveTime::from_hms_opt(deadline_hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    if now.time() >= deadline {
        return ReportingDay {
            day: today,
            is_holiday: false,
        };
    }

    let day = match today.weekday() {
        Weekday::Mon => today - Duration::days(3),
        _ => today - Duration::days(1),
    };

    ReportingDay {
        day,
        is_holiday: calendar.contains(day),
    }
}

/// Most recent Monday (inclusive) through `today`.
pub fn week_to_date(today: NaiveDate) -> ReportingWindow {
    let offset = i64::from(today.weekday().num_days_from_monday());
    ReportingWindow {
        from: today - Duration::days(offset),
        to: today,
    }
}

/// Harvest query format for dates.
pub fn format_query_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
