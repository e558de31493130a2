//! Remote calendar HTTP client
//!
//! Speaks a Google-Calendar-shaped REST surface. Local events carry naive
//! date/time strings; they cross the wire as RFC 3339 UTC.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ValetError};
use crate::timefmt;
use crate::types::{Event, DEFAULT_EVENT_DURATION_MIN};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

const CALENDAR_ID: &str = "primary";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 2;
const MAX_RESULTS: u32 = 50;

/// Event payload in the remote schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub start: WireTime,
    pub end: WireTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

impl WireTime {
    fn utc(dt: DateTime<Utc>) -> Self {
        Self {
            date_time: dt.to_rfc3339(),
            time_zone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
    start: Option<WireInstant>,
}

/// Remote instants arrive as either a `dateTime` or an all-day `date`.
#[derive(Debug, Deserialize)]
struct WireInstant {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireEventList {
    #[serde(default)]
    items: Vec<WireEvent>,
}

/// A remote event, times already normalized to UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEvent {
    pub id: String,
    pub summary: String,
    pub description: String,
    pub location: String,
    pub start: Option<NaiveDateTime>,
}

impl RemoteEvent {
    /// Start time the way the assistant speaks it; all-day or unparseable
    /// starts fall back to the summary-only shape upstream.
    pub fn start_spoken(&self) -> String {
        self.start
            .map(timefmt::spoken)
            .unwrap_or_else(|| "an unspecified time".to_string())
    }
}

impl From<WireEvent> for RemoteEvent {
    fn from(wire: WireEvent) -> Self {
        let start = wire.start.and_then(|instant| match instant.date_time {
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .ok()
                .map(|dt| dt.naive_utc()),
            None => instant
                .date
                .as_deref()
                .and_then(|d| timefmt::parse_date(d).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
        });
        Self {
            id: wire.id,
            summary: wire.summary.unwrap_or_else(|| "No title".to_string()),
            description: wire.description.unwrap_or_default(),
            location: wire.location.unwrap_or_default(),
            start,
        }
    }
}

/// Translate a local event to the remote schema. Naive local times are
/// treated as UTC; a missing end defaults to start + 60 minutes.
pub fn payload_for(event: &Event) -> Result<EventPayload> {
    let start = timefmt::parse_datetime(&event.date, &event.time)?.and_utc();
    let minutes = if event.duration_minutes > 0 {
        event.duration_minutes
    } else {
        DEFAULT_EVENT_DURATION_MIN
    };
    let end = start + chrono::Duration::minutes(minutes);
    Ok(EventPayload {
        summary: event.title.clone(),
        description: event.description.clone(),
        location: event.location.clone(),
        start: WireTime::utc(start),
        end: WireTime::utc(end),
    })
}

/// Blocking HTTP client with a fixed timeout and bounded retry.
pub struct CalendarClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl CalendarClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", self.base_url, CALENDAR_ID)
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), event_id)
    }

    /// Insert an event, returning the remote id.
    pub fn insert(&self, token: &str, payload: &EventPayload) -> Result<String> {
        let body = self.with_retry("insert", || {
            let response = self
                .http
                .post(self.events_url())
                .bearer_auth(token)
                .json(payload)
                .send()?
                .error_for_status()?;
            Ok(response.json::<serde_json::Value>()?)
        })?;
        body["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ValetError::Calendar("insert response carried no event id".to_string()))
    }

    /// Events between two instants, expanded and ordered by start time.
    pub fn list(
        &self,
        token: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>> {
        let body = self.with_retry("list", || {
            let response = self
                .http
                .get(self.events_url())
                .bearer_auth(token)
                .query(&[
                    ("timeMin", time_min.to_rfc3339()),
                    ("timeMax", time_max.to_rfc3339()),
                    ("maxResults", MAX_RESULTS.to_string()),
                    ("singleEvents", "true".to_string()),
                    ("orderBy", "startTime".to_string()),
                ])
                .send()?
                .error_for_status()?;
            Ok(response.json::<WireEventList>()?)
        })?;
        Ok(body.items.into_iter().map(RemoteEvent::from).collect())
    }

    pub fn update(&self, token: &str, event_id: &str, payload: &EventPayload) -> Result<()> {
        self.with_retry("update", || {
            self.http
                .put(self.event_url(event_id))
                .bearer_auth(token)
                .json(payload)
                .send()?
                .error_for_status()?;
            Ok(())
        })
    }

    pub fn delete(&self, token: &str, event_id: &str) -> Result<()> {
        self.with_retry("delete", || {
            self.http
                .delete(self.event_url(event_id))
                .bearer_auth(token)
                .send()?
                .error_for_status()?;
            Ok(())
        })
    }

    fn with_retry<T>(&self, op: &str, mut attempt: impl FnMut() -> Result<T>) -> Result<T> {
        let mut last_err = None;
        for n in 1..=MAX_ATTEMPTS {
            match attempt() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && n < MAX_ATTEMPTS => {
                    debug!(op, attempt = n, error = %e, "remote calendar call failed, retrying");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err
            .unwrap_or_else(|| ValetError::Calendar(format!("{op} failed with no attempts made"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(date: &str, time: &str, minutes: i64) -> Event {
        Event {
            id: 1,
            title: "Standup".to_string(),
            description: String::new(),
            location: String::new(),
            date: date.to_string(),
            time: time.to_string(),
            duration_minutes: minutes,
            created_at: Utc::now(),
            external_id: None,
        }
    }

    #[test]
    fn payload_carries_utc_rfc3339_times() {
        let payload = payload_for(&event("2024-03-01", "14:30", 30)).unwrap();
        assert_eq!(payload.start.date_time, "2024-03-01T14:30:00+00:00");
        assert_eq!(payload.end.date_time, "2024-03-01T15:00:00+00:00");
        assert_eq!(payload.start.time_zone, "UTC");
    }

    #[test]
    fn zero_duration_falls_back_to_an_hour() {
        let payload = payload_for(&event("2024-03-01", "14:30", 0)).unwrap();
        assert_eq!(payload.end.date_time, "2024-03-01T15:30:00+00:00");
    }

    #[test]
    fn wire_events_normalize_missing_fields() {
        let wire: WireEvent = serde_json::from_str(
            r#"{"id": "abc", "start": {"dateTime": "2024-03-01T14:30:00Z"}}"#,
        )
        .unwrap();
        let remote = RemoteEvent::from(wire);
        assert_eq!(remote.summary, "No title");
        assert_eq!(
            remote.start_spoken(),
            "Friday, March 01, 2024 at 02:30 PM"
        );
    }

    #[test]
    fn all_day_events_start_at_midnight() {
        let wire: WireEvent = serde_json::from_str(
            r#"{"id": "abc", "summary": "Holiday", "start": {"date": "2024-03-01"}}"#,
        )
        .unwrap();
        let remote = RemoteEvent::from(wire);
        assert_eq!(
            remote.start.unwrap(),
            timefmt::parse_datetime("2024-03-01", "00:00").unwrap()
        );
    }
}
