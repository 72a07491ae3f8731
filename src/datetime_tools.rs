//! Date arithmetic helpers exposed to the agent.
//!
//! The only implicit input is "today" (UTC), supplied by a clock so that the
//! range helpers can be pinned in tests.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use std::sync::Arc;

use crate::error::{ToolError, ToolResult};

const ISO_DATE: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    Days,
    Months,
    Years,
}

impl DateUnit {
    /// Accepts the single-letter codes `d`, `m` and `y`.
    pub fn parse(code: &str) -> ToolResult<Self> {
        match code {
            "d" => Ok(DateUnit::Days),
            "m" => Ok(DateUnit::Months),
            "y" => Ok(DateUnit::Years),
            other => Err(ToolError::validation(format!(
                "unit must be d, m, or y (got '{other}')"
            ))),
        }
    }
}

#[derive(Clone)]
pub struct DateTimeTools {
    clock: Arc<dyn Fn() -> NaiveDate + Send + Sync>,
}

impl Default for DateTimeTools {
    fn default() -> Self {
        Self::new()
    }
}

impl DateTimeTools {
    pub fn new() -> Self {
        Self::with_clock(|| Utc::now().date_naive())
    }

    pub fn with_clock(clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
        }
    }

    pub fn fixed(today: NaiveDate) -> Self {
        Self::with_clock(move || today)
    }

    fn today_date(&self) -> NaiveDate {
        (self.clock)()
    }

    pub fn today(&self) -> String {
        self.today_date().format(ISO_DATE).to_string()
    }

    pub fn this_month(&self) -> String {
        self.today_date().format("%Y-%m").to_string()
    }

    pub fn this_year(&self) -> String {
        self.today_date().year().to_string()
    }

    pub fn past_years_range(&self, years: i32) -> ToolResult<String> {
        self.past_range(years, DateUnit::Years)
    }

    pub fn past_months_range(&self, months: i32) -> ToolResult<String> {
        self.past_range(months, DateUnit::Months)
    }

    pub fn past_days_range(&self, days: i32) -> ToolResult<String> {
        self.past_range(days, DateUnit::Days)
    }

    /// Interval `start/end` where `end` is today and `start` is `amount` units earlier.
    fn past_range(&self, amount: i32, unit: DateUnit) -> ToolResult<String> {
        let end = self.today_date();
        let start = shift(end, amount.checked_neg().unwrap_or(i32::MAX), unit)?;
        Ok(format!("{}/{}", start.format(ISO_DATE), end.format(ISO_DATE)))
    }

    pub fn offset_date(&self, iso_date: &str, amount: i32, unit: &str) -> ToolResult<String> {
        let date = parse_iso_date(iso_date)?;
        let unit = DateUnit::parse(unit)?;
        Ok(shift(date, amount, unit)?.format(ISO_DATE).to_string())
    }
}

/// Parses `YYYY-MM-DD`, also accepting an RFC 3339 timestamp whose date part is used.
pub fn parse_iso_date(input: &str) -> ToolResult<NaiveDate> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, ISO_DATE)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .ok_or_else(|| ToolError::validation(format!("'{input}' is not an ISO date (YYYY-MM-DD)")))
}

/// Month and year shifts clamp to the last day of the target month.
pub fn shift(date: NaiveDate, amount: i32, unit: DateUnit) -> ToolResult<NaiveDate> {
    let shifted = match unit {
        DateUnit::Days => date.checked_add_signed(Duration::days(i64::from(amount))),
        DateUnit::Months => shift_months(date, i64::from(amount)),
        DateUnit::Years => shift_months(date, i64::from(amount) * 12),
    };
    shifted.ok_or_else(|| ToolError::validation(format!("date out of range shifting {date}")))
}

fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = u32::try_from(months.unsigned_abs()).ok()?;
    if months >= 0 {
        date.checked_add_months(Months::new(magnitude))
    } else {
        date.checked_sub_months(Months::new(magnitude))
    }
}
