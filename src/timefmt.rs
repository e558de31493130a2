//! Date and time contracts
//!
//! All parsing and assistant-facing rendering goes through this module so the
//! format strings live in exactly one place.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Result, ValetError};

/// Calendar date wire format
pub const DATE_FMT: &str = "%Y-%m-%d";

/// Wall-clock wire format
pub const TIME_FMT: &str = "%H:%M";

/// What the assistant says out loud, e.g. `Friday, March 01, 2024 at 02:30 PM`
pub const SPOKEN_FMT: &str = "%A, %B %d, %Y at %I:%M %p";

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|e| ValetError::InvalidInput(format!("{e}")))
}

/// Parse an `HH:MM` time string.
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FMT)
        .map_err(|e| ValetError::InvalidInput(format!("{e}")))
}

/// Parse a date and time pair into one timestamp.
pub fn parse_datetime(date: &str, time: &str) -> Result<NaiveDateTime> {
    Ok(parse_date(date)?.and_time(parse_time(time)?))
}

/// Render a timestamp the way the assistant speaks it.
pub fn spoken(dt: NaiveDateTime) -> String {
    dt.format(SPOKEN_FMT).to_string()
}

/// Current local wall-clock time.
pub fn now_local() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
