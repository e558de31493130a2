//! Remote calendar adapter
//!
//! Optional: the service only exists when a client secret is on disk, and
//! every caller is expected to fall back to local storage when a call fails.

pub mod auth;
pub mod client;

use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveTime};
use parking_lot::Mutex;
use tracing::info;

pub use auth::{AuthState, Authenticator};
pub use client::{CalendarClient, EventPayload, RemoteEvent, DEFAULT_BASE_URL};

use crate::error::Result;
use crate::types::Event;

/// Authenticated access to the remote calendar.
pub struct CalendarService {
    auth: Mutex<Authenticator>,
    client: CalendarClient,
}

impl CalendarService {
    /// Build the adapter when a client secret exists under
    /// `credentials_dir`; `Ok(None)` means it stays disabled.
    pub fn discover(credentials_dir: &Path, base_url: Option<&str>) -> Result<Option<Self>> {
        let auth = match Authenticator::load(credentials_dir)? {
            Some(auth) => auth,
            None => return Ok(None),
        };
        info!(state = ?auth.state(), "remote calendar adapter configured");
        let client = CalendarClient::new(base_url.unwrap_or(DEFAULT_BASE_URL))?;
        Ok(Some(Self {
            auth: Mutex::new(auth),
            client,
        }))
    }

    pub fn state(&self) -> AuthState {
        self.auth.lock().state()
    }

    /// Mirror a local event to the remote calendar, returning the remote id.
    pub fn insert(&self, event: &Event) -> Result<String> {
        let token = self.auth.lock().access_token()?;
        let payload = client::payload_for(event)?;
        self.client.insert(&token, &payload)
    }

    /// Remote events with a start inside `[from, from + days)`.
    pub fn events_between(&self, from: NaiveDate, days: i64) -> Result<Vec<RemoteEvent>> {
        let token = self.auth.lock().access_token()?;
        let time_min = from.and_time(NaiveTime::MIN).and_utc();
        let time_max = time_min + Duration::days(days.max(1));
        self.client.list(&token, time_min, time_max)
    }

    pub fn update(&self, event: &Event, remote_id: &str) -> Result<()> {
        let token = self.auth.lock().access_token()?;
        let payload = client::payload_for(event)?;
        self.client.update(&token, remote_id, &payload)
    }

    pub fn remove(&self, remote_id: &str) -> Result<()> {
        let token = self.auth.lock().access_token()?;
        self.client.delete(&token, remote_id)
    }
}
