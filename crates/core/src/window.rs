#![forbid(unsafe_code)]

//! Time windows shared by every query.
//!
//! Day-level filters are inclusive on both dates and compile to the half-open millisecond range
//! `[start 00:00, (end + 1) 00:00)`. Rolling hour windows are `[now - n h, now)`. All
//! timestamps are UTC Unix milliseconds.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

pub const MS_PER_HOUR: i64 = 3_600_000;
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Half-open millisecond interval; either endpoint may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
}

impl TimeRange {
    pub const UNBOUNDED: Self = Self {
        start_ms: None,
        end_ms: None,
    };

    pub fn between(start_ms: i64, end_ms: i64) -> Self {
        Self {
            start_ms: Some(start_ms),
            end_ms: Some(end_ms),
        }
    }

    pub fn rolling_hours(now_ms: i64, hours: i64) -> Self {
        Self::between(now_ms.saturating_sub(hours.saturating_mul(MS_PER_HOUR)), now_ms)
    }
}

/// Inclusive calendar-day window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

impl DateWindow {
    pub const ALL_TIME: Self = Self {
        start: None,
        end: None,
    };

    pub fn new(start: Option<Date>, end: Option<Date>) -> Result<Self, WindowError> {
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(WindowError::Inverted);
        }
        Ok(Self { start, end })
    }

    /// Blank strings count as an omitted endpoint.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, WindowError> {
        let start = parse_optional_date(start)?;
        let end = parse_optional_date(end)?;
        Self::new(start, end)
    }

    pub fn to_time_range(&self) -> TimeRange {
        TimeRange {
            start_ms: self.start.map(day_start_ms),
            end_ms: self.end.and_then(|end| end.next_day()).map(day_start_ms),
        }
    }

    /// Human-readable period used in report headers.
    pub fn describe(&self) -> String {
        match (self.start, self.end) {
            (Some(start), Some(end)) => format!("{} to {}", format_date(start), format_date(end)),
            (Some(start), None) => format!("Since {}", format_date(start)),
            (None, Some(end)) => format!("Until {}", format_date(end)),
            (None, None) => "All time".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateRangePreset {
    Today,
    Last7Days,
    Last30Days,
    Last90Days,
    Custom,
}

impl DateRangePreset {
    pub fn parse(value: &str) -> Result<Self, WindowError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "7days" => Ok(Self::Last7Days),
            "30days" => Ok(Self::Last30Days),
            "90days" => Ok(Self::Last90Days),
            "custom" => Ok(Self::Custom),
            other => Err(WindowError::UnknownPreset(other.to_string())),
        }
    }

    /// Rolling presets end on `today` inclusive; `Custom` takes the explicit window as given.
    pub fn resolve(self, today: Date, custom: DateWindow) -> DateWindow {
        let days_back = match self {
            Self::Today => 0,
            Self::Last7Days => 6,
            Self::Last30Days => 29,
            Self::Last90Days => 89,
            Self::Custom => return custom,
        };
        let start = today
            .checked_sub(Duration::days(days_back))
            .unwrap_or(Date::MIN);
        DateWindow {
            start: Some(start),
            end: Some(today),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WindowError {
    InvalidDate(String),
    Inverted,
    UnknownPreset(String),
}

impl std::fmt::Display for WindowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(value) => write!(f, "invalid date '{value}' (expected YYYY-MM-DD)"),
            Self::Inverted => write!(f, "start date is after end date"),
            Self::UnknownPreset(value) => write!(f, "unknown date range '{value}'"),
        }
    }
}

impl std::error::Error for WindowError {}

pub fn parse_date(value: &str) -> Result<Date, WindowError> {
    let value = value.trim();
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|_| WindowError::InvalidDate(value.to_string()))
}

fn parse_optional_date(value: Option<&str>) -> Result<Option<Date>, WindowError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value).map(Some),
    }
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "0000-00-00".to_string())
}

pub fn day_start_ms(date: Date) -> i64 {
    date.midnight().assume_utc().unix_timestamp() * 1000
}

pub fn datetime_of_ms(ts_ms: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ts_ms) * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

pub fn date_of_ms(ts_ms: i64) -> Date {
    datetime_of_ms(ts_ms).date()
}

pub fn ms_to_rfc3339(ts_ms: i64) -> String {
    datetime_of_ms(ts_ms)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Serde adapter that writes a millisecond timestamp as an RFC 3339 string.
pub fn serialize_ms_rfc3339<S: serde::Serializer>(
    ts_ms: &i64,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ms_to_rfc3339(*ts_ms))
}

pub fn now_ms() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}
