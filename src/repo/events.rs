//! Events repository

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};

use crate::error::{Result, ValetError};
use crate::store::RecordStore;
use crate::timefmt;
use crate::types::{Event, NewEvent, DEFAULT_EVENT_DURATION_MIN};

const COLLECTION: &str = "events";

/// JSON-backed event storage
#[derive(Clone)]
pub struct EventsRepo {
    store: Arc<RecordStore>,
}

impl EventsRepo {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Schedule a new event. Date and time are validated before any write.
    pub fn schedule(&self, input: &NewEvent) -> Result<Event> {
        // Rejects malformed dates/times up front; the parsed value itself is
        // only needed again at render time.
        timefmt::parse_datetime(&input.date, &input.time)?;

        let duration = input.duration_minutes.unwrap_or(DEFAULT_EVENT_DURATION_MIN);
        if duration <= 0 {
            return Err(ValetError::InvalidInput(
                "Duration must be a positive number of minutes.".to_string(),
            ));
        }

        let lock = self.store.collection_lock(COLLECTION);
        let _guard = lock.lock();

        let mut loaded = self.store.load::<Event>(COLLECTION)?;
        let max = loaded.records.iter().map(|e| e.id).max().unwrap_or(0);
        let event = Event {
            id: self.store.next_id(COLLECTION, max)?,
            title: input.title.clone(),
            description: input.description.clone().unwrap_or_default(),
            location: input.location.clone().unwrap_or_default(),
            date: input.date.clone(),
            time: input.time.clone(),
            duration_minutes: duration,
            created_at: Utc::now(),
            external_id: None,
        };
        loaded.records.push(event.clone());
        self.store.save(COLLECTION, &loaded.records)?;
        Ok(event)
    }

    /// All events, or only those on an exact `YYYY-MM-DD` date.
    pub fn list(&self, date: Option<&str>) -> Result<Vec<Event>> {
        let loaded = self.store.load::<Event>(COLLECTION)?;
        Ok(match date {
            Some(d) => loaded.records.into_iter().filter(|e| e.date == d).collect(),
            None => loaded.records,
        })
    }

    /// Events with a date inside `[from, from + days)`, collection order.
    pub fn window(&self, from: NaiveDate, days: i64) -> Result<Vec<Event>> {
        let until = from + Duration::days(days);
        let loaded = self.store.load::<Event>(COLLECTION)?;
        Ok(loaded
            .records
            .into_iter()
            .filter(|e| {
                timefmt::parse_date(&e.date)
                    .map(|d| d >= from && d < until)
                    .unwrap_or(false)
            })
            .collect())
    }

    pub fn find(&self, id: i64) -> Result<Event> {
        let loaded = self.store.load::<Event>(COLLECTION)?;
        loaded
            .records
            .into_iter()
            .find(|e| e.id == id)
            .ok_or(ValetError::NotFound {
                entity: "event",
                id,
            })
    }

    /// Record the remote calendar id for an event mirrored to the adapter.
    pub fn attach_external_id(&self, id: i64, external_id: &str) -> Result<()> {
        let lock = self.store.collection_lock(COLLECTION);
        let _guard = lock.lock();

        let mut loaded = self.store.load::<Event>(COLLECTION)?;
        let event = loaded
            .records
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(ValetError::NotFound {
                entity: "event",
                id,
            })?;
        event.external_id = Some(external_id.to_string());
        self.store.save(COLLECTION, &loaded.records)
    }

    /// Remove an event, returning the deleted record.
    pub fn delete(&self, id: i64) -> Result<Event> {
        let lock = self.store.collection_lock(COLLECTION);
        let _guard = lock.lock();

        let mut loaded = self.store.load::<Event>(COLLECTION)?;
        let idx = loaded
            .records
            .iter()
            .position(|e| e.id == id)
            .ok_or(ValetError::NotFound {
                entity: "event",
                id,
            })?;
        let removed = loaded.records.remove(idx);
        self.store.save(COLLECTION, &loaded.records)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn repo(dir: &std::path::Path) -> EventsRepo {
        EventsRepo::new(Arc::new(RecordStore::open(dir).unwrap()))
    }

    fn standup(date: &str, time: &str) -> NewEvent {
        NewEvent {
            date: date.to_string(),
            time: time.to_string(),
            title: "Standup".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn schedule_assigns_sequential_ids() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        let first = repo.schedule(&standup("2024-03-01", "14:30")).unwrap();
        let second = repo.schedule(&standup("2024-03-02", "09:00")).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.duration_minutes, DEFAULT_EVENT_DURATION_MIN);
    }

    #[test]
    fn schedule_rejects_bad_date_without_writing() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        assert!(repo.schedule(&standup("03/01/2024", "14:30")).is_err());
        assert!(repo.list(None).unwrap().is_empty());
    }

    #[test]
    fn list_filters_by_exact_date() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        repo.schedule(&standup("2024-03-01", "14:30")).unwrap();
        repo.schedule(&standup("2024-03-02", "14:30")).unwrap();
        let on_day = repo.list(Some("2024-03-01")).unwrap();
        assert_eq!(on_day.len(), 1);
        assert_eq!(on_day[0].date, "2024-03-01");
    }

    #[test]
    fn window_excludes_end_date() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        repo.schedule(&standup("2024-03-01", "09:00")).unwrap();
        repo.schedule(&standup("2024-03-07", "09:00")).unwrap();
        repo.schedule(&standup("2024-03-08", "09:00")).unwrap();
        let from = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let within = repo.window(from, 7).unwrap();
        assert_eq!(within.len(), 2);
    }

    #[test]
    fn delete_keeps_ids_monotonic() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        let first = repo.schedule(&standup("2024-03-01", "14:30")).unwrap();
        repo.delete(first.id).unwrap();
        let next = repo.schedule(&standup("2024-03-02", "14:30")).unwrap();
        assert_eq!(next.id, 2);
    }
}
