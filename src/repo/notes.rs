//! Notes repository

use std::sync::Arc;

use chrono::Utc;

use crate::error::{Result, ValetError};
use crate::store::RecordStore;
use crate::types::{NewNote, Note};

const COLLECTION: &str = "notes";

/// JSON-backed note storage
#[derive(Clone)]
pub struct NotesRepo {
    store: Arc<RecordStore>,
}

impl NotesRepo {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    pub fn add(&self, input: &NewNote) -> Result<Note> {
        let lock = self.store.collection_lock(COLLECTION);
        let _guard = lock.lock();

        let mut loaded = self.store.load::<Note>(COLLECTION)?;
        let max = loaded.records.iter().map(|n| n.id).max().unwrap_or(0);
        let now = Utc::now();
        let note = Note {
            id: self.store.next_id(COLLECTION, max)?,
            title: input.title.clone(),
            content: input.content.clone(),
            tags: input.tags.clone(),
            created_at: now,
            updated_at: now,
        };
        loaded.records.push(note.clone());
        self.store.save(COLLECTION, &loaded.records)?;
        Ok(note)
    }

    pub fn get(&self, id: i64) -> Result<Note> {
        let loaded = self.store.load::<Note>(COLLECTION)?;
        loaded
            .records
            .into_iter()
            .find(|n| n.id == id)
            .ok_or(ValetError::NotFound { entity: "note", id })
    }

    /// Update any subset of fields; `updated_at` is refreshed on every call.
    pub fn update(
        &self,
        id: i64,
        title: Option<&str>,
        content: Option<&str>,
        tags: Option<&[String]>,
    ) -> Result<Note> {
        let lock = self.store.collection_lock(COLLECTION);
        let _guard = lock.lock();

        let mut loaded = self.store.load::<Note>(COLLECTION)?;
        let note = loaded
            .records
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(ValetError::NotFound { entity: "note", id })?;

        if let Some(title) = title {
            note.title = title.to_string();
        }
        if let Some(content) = content {
            note.content = content.to_string();
        }
        if let Some(tags) = tags {
            note.tags = tags.to_vec();
        }
        note.updated_at = Utc::now();

        let updated = note.clone();
        self.store.save(COLLECTION, &loaded.records)?;
        Ok(updated)
    }

    pub fn delete(&self, id: i64) -> Result<Note> {
        let lock = self.store.collection_lock(COLLECTION);
        let _guard = lock.lock();

        let mut loaded = self.store.load::<Note>(COLLECTION)?;
        let idx = loaded
            .records
            .iter()
            .position(|n| n.id == id)
            .ok_or(ValetError::NotFound { entity: "note", id })?;
        let removed = loaded.records.remove(idx);
        self.store.save(COLLECTION, &loaded.records)?;
        Ok(removed)
    }

    /// All notes, or only those carrying `tag` (case-insensitive membership).
    pub fn list(&self, tag: Option<&str>) -> Result<Vec<Note>> {
        let loaded = self.store.load::<Note>(COLLECTION)?;
        Ok(match tag {
            Some(tag) => {
                let needle = tag.to_lowercase();
                loaded
                    .records
                    .into_iter()
                    .filter(|n| n.tags.iter().any(|t| t.to_lowercase() == needle))
                    .collect()
            }
            None => loaded.records,
        })
    }

    /// Case-insensitive substring match over title, content, and tags.
    /// Results keep collection order; there is no ranking.
    pub fn search(&self, query: &str) -> Result<Vec<Note>> {
        let needle = query.to_lowercase();
        let loaded = self.store.load::<Note>(COLLECTION)?;
        Ok(loaded
            .records
            .into_iter()
            .filter(|n| {
                n.title.to_lowercase().contains(&needle)
                    || n.content.to_lowercase().contains(&needle)
                    || n.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .collect())
    }

    /// Distinct tags across all notes, in first-seen order.
    pub fn tags(&self) -> Result<Vec<String>> {
        let loaded = self.store.load::<Note>(COLLECTION)?;
        let mut seen = Vec::new();
        for note in &loaded.records {
            for tag in &note.tags {
                if !seen.contains(tag) {
                    seen.push(tag.clone());
                }
            }
        }
        Ok(seen)
    }
}
