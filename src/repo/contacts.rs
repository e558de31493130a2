//! Contacts repository

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ValetError};
use crate::store::RecordStore;
use crate::types::{Contact, NewContact};

const COLLECTION: &str = "contacts";

/// Simple `local@domain.tld` shape; not RFC 5322.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() || EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValetError::InvalidInput(
            "Invalid email address format.".to_string(),
        ))
    }
}

/// JSON-backed contact storage. Names are unique case-insensitively.
#[derive(Clone)]
pub struct ContactsRepo {
    store: Arc<RecordStore>,
}

impl ContactsRepo {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Add a contact. A duplicate name (case-insensitive) or malformed email
    /// fails without touching storage.
    pub fn add(&self, input: &NewContact) -> Result<Contact> {
        validate_email(input.email.as_deref().unwrap_or(""))?;

        let lock = self.store.collection_lock(COLLECTION);
        let _guard = lock.lock();

        let mut loaded = self.store.load::<Contact>(COLLECTION)?;
        let lower = input.name.to_lowercase();
        if loaded
            .records
            .iter()
            .any(|c| c.name.to_lowercase() == lower)
        {
            return Err(ValetError::DuplicateName(input.name.clone()));
        }

        let max = loaded.records.iter().map(|c| c.id).max().unwrap_or(0);
        let contact = Contact {
            id: self.store.next_id(COLLECTION, max)?,
            name: input.name.clone(),
            email: input.email.clone().unwrap_or_default(),
            phone: input.phone.clone().unwrap_or_default(),
            address: input.address.clone().unwrap_or_default(),
            notes: input.notes.clone().unwrap_or_default(),
        };
        loaded.records.push(contact.clone());
        self.store.save(COLLECTION, &loaded.records)?;
        Ok(contact)
    }

    pub fn get(&self, id: i64) -> Result<Contact> {
        let loaded = self.store.load::<Contact>(COLLECTION)?;
        loaded
            .records
            .into_iter()
            .find(|c| c.id == id)
            .ok_or(ValetError::NotFound {
                entity: "contact",
                id,
            })
    }

    /// Exact name lookup, case-insensitive.
    pub fn get_by_name(&self, name: &str) -> Result<Option<Contact>> {
        let lower = name.to_lowercase();
        let loaded = self.store.load::<Contact>(COLLECTION)?;
        Ok(loaded
            .records
            .into_iter()
            .find(|c| c.name.to_lowercase() == lower))
    }

    /// Update any subset of fields. Renaming onto another contact's name
    /// fails with a duplicate error and mutates nothing.
    pub fn update(&self, id: i64, patch: &NewContact) -> Result<Contact> {
        if let Some(email) = patch.email.as_deref() {
            validate_email(email)?;
        }

        let lock = self.store.collection_lock(COLLECTION);
        let _guard = lock.lock();

        let mut loaded = self.store.load::<Contact>(COLLECTION)?;
        if !patch.name.is_empty() {
            let lower = patch.name.to_lowercase();
            if loaded
                .records
                .iter()
                .any(|c| c.id != id && c.name.to_lowercase() == lower)
            {
                return Err(ValetError::DuplicateName(patch.name.clone()));
            }
        }

        let contact = loaded
            .records
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ValetError::NotFound {
                entity: "contact",
                id,
            })?;

        if !patch.name.is_empty() {
            contact.name = patch.name.clone();
        }
        if let Some(email) = &patch.email {
            contact.email = email.clone();
        }
        if let Some(phone) = &patch.phone {
            contact.phone = phone.clone();
        }
        if let Some(address) = &patch.address {
            contact.address = address.clone();
        }
        if let Some(notes) = &patch.notes {
            contact.notes = notes.clone();
        }

        let updated = contact.clone();
        self.store.save(COLLECTION, &loaded.records)?;
        Ok(updated)
    }

    pub fn delete(&self, id: i64) -> Result<Contact> {
        let lock = self.store.collection_lock(COLLECTION);
        let _guard = lock.lock();

        let mut loaded = self.store.load::<Contact>(COLLECTION)?;
        let idx = loaded
            .records
            .iter()
            .position(|c| c.id == id)
            .ok_or(ValetError::NotFound {
                entity: "contact",
                id,
            })?;
        let removed = loaded.records.remove(idx);
        self.store.save(COLLECTION, &loaded.records)?;
        Ok(removed)
    }

    /// Case-insensitive substring match across name, email, phone, address,
    /// and notes; collection order, no ranking.
    pub fn search(&self, query: &str) -> Result<Vec<Contact>> {
        let needle = query.to_lowercase();
        let loaded = self.store.load::<Contact>(COLLECTION)?;
        Ok(loaded
            .records
            .into_iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle)
                    || c.email.to_lowercase().contains(&needle)
                    || c.phone.to_lowercase().contains(&needle)
                    || c.address.to_lowercase().contains(&needle)
                    || c.notes.to_lowercase().contains(&needle)
            })
            .collect())
    }

    pub fn list(&self) -> Result<Vec<Contact>> {
        Ok(self.store.load::<Contact>(COLLECTION)?.records)
    }
}
