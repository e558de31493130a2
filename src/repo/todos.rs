//! To-do repository

use std::sync::Arc;

use chrono::Utc;

use crate::error::{Result, ValetError};
use crate::store::RecordStore;
use crate::timefmt;
use crate::types::{NewTodo, Priority, Todo};

const COLLECTION: &str = "todos";

/// What happened when a todo was marked complete
#[derive(Debug, Clone, PartialEq)]
pub enum CompleteOutcome {
    Completed(Todo),
    /// No-op: the todo was already done, nothing was written
    AlreadyCompleted(Todo),
}

/// JSON-backed to-do storage
#[derive(Clone)]
pub struct TodosRepo {
    store: Arc<RecordStore>,
}

impl TodosRepo {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Add a to-do. Priority is normalized to lowercase and defaults to
    /// medium; an unrecognized priority or malformed due date aborts before
    /// any write.
    pub fn add(&self, input: &NewTodo) -> Result<Todo> {
        let priority = match input.priority.as_deref() {
            Some(raw) => raw.parse::<Priority>().map_err(ValetError::InvalidInput)?,
            None => Priority::default(),
        };
        if let Some(due) = input.due_date.as_deref() {
            timefmt::parse_date(due).map_err(|_| {
                ValetError::InvalidInput("Due date must be in YYYY-MM-DD format.".to_string())
            })?;
        }

        let lock = self.store.collection_lock(COLLECTION);
        let _guard = lock.lock();

        let mut loaded = self.store.load::<Todo>(COLLECTION)?;
        let max = loaded.records.iter().map(|t| t.id).max().unwrap_or(0);
        let todo = Todo {
            id: self.store.next_id(COLLECTION, max)?,
            task: input.task.clone(),
            priority,
            due_date: input.due_date.clone(),
            completed: false,
            created_at: Utc::now(),
        };
        loaded.records.push(todo.clone());
        self.store.save(COLLECTION, &loaded.records)?;
        Ok(todo)
    }

    /// List todos, optionally filtered by priority; completed items are
    /// hidden unless asked for.
    pub fn list(&self, priority: Option<Priority>, show_completed: bool) -> Result<Vec<Todo>> {
        let loaded = self.store.load::<Todo>(COLLECTION)?;
        Ok(loaded
            .records
            .into_iter()
            .filter(|t| show_completed || !t.completed)
            .filter(|t| priority.map_or(true, |p| t.priority == p))
            .collect())
    }

    pub fn find(&self, id: i64) -> Result<Todo> {
        let loaded = self.store.load::<Todo>(COLLECTION)?;
        loaded
            .records
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(ValetError::NotFound { entity: "task", id })
    }

    /// Mark a todo complete. Completing an already-completed todo is a no-op
    /// and does not rewrite the collection.
    pub fn complete(&self, id: i64) -> Result<CompleteOutcome> {
        let lock = self.store.collection_lock(COLLECTION);
        let _guard = lock.lock();

        let mut loaded = self.store.load::<Todo>(COLLECTION)?;
        let todo = loaded
            .records
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(ValetError::NotFound { entity: "task", id })?;

        if todo.completed {
            return Ok(CompleteOutcome::AlreadyCompleted(todo.clone()));
        }
        todo.completed = true;
        let done = todo.clone();
        self.store.save(COLLECTION, &loaded.records)?;
        Ok(CompleteOutcome::Completed(done))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn repo(dir: &std::path::Path) -> TodosRepo {
        TodosRepo::new(Arc::new(RecordStore::open(dir).unwrap()))
    }

    fn task(text: &str, priority: Option<&str>) -> NewTodo {
        NewTodo {
            task: text.to_string(),
            priority: priority.map(String::from),
            due_date: None,
        }
    }

    #[test]
    fn add_assigns_next_id_and_persists_one_record() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        let before = repo.list(None, true).unwrap().len();
        let todo = repo.add(&task("Buy groceries", None)).unwrap();
        assert_eq!(todo.id as usize, before + 1);
        assert_eq!(repo.list(None, true).unwrap().len(), before + 1);
        assert_eq!(todo.priority, Priority::Medium);
    }

    #[test]
    fn priority_is_normalized_on_write() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        let todo = repo.add(&task("Ship release", Some("HIGH"))).unwrap();
        assert_eq!(todo.priority, Priority::High);

        let raw = std::fs::read_to_string(dir.path().join("todos.json")).unwrap();
        assert!(raw.contains("\"high\""));
        assert!(!raw.contains("HIGH"));
    }

    #[test]
    fn unknown_priority_is_rejected_without_mutation() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        let err = repo.add(&task("Do the thing", Some("urgent"))).unwrap_err();
        assert_eq!(
            err.reason(),
            "Priority must be 'low', 'medium', or 'high'. Got 'urgent'."
        );
        assert!(repo.list(None, true).unwrap().is_empty());
    }

    #[test]
    fn bad_due_date_is_rejected() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        let input = NewTodo {
            task: "Renew passport".to_string(),
            priority: None,
            due_date: Some("next tuesday".to_string()),
        };
        let err = repo.add(&input).unwrap_err();
        assert_eq!(err.reason(), "Due date must be in YYYY-MM-DD format.");
    }

    #[test]
    fn complete_is_idempotent() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        let todo = repo.add(&task("Water plants", None)).unwrap();

        let first = repo.complete(todo.id).unwrap();
        assert!(matches!(first, CompleteOutcome::Completed(_)));

        let written = std::fs::metadata(dir.path().join("todos.json"))
            .unwrap()
            .modified()
            .unwrap();
        let second = repo.complete(todo.id).unwrap();
        assert!(matches!(second, CompleteOutcome::AlreadyCompleted(_)));
        let after = std::fs::metadata(dir.path().join("todos.json"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(written, after);
        assert_eq!(repo.list(None, true).unwrap().len(), 1);
    }

    #[test]
    fn list_hides_completed_by_default() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        let done = repo.add(&task("Old chore", Some("low"))).unwrap();
        repo.add(&task("New chore", Some("high"))).unwrap();
        repo.complete(done.id).unwrap();

        assert_eq!(repo.list(None, false).unwrap().len(), 1);
        assert_eq!(repo.list(None, true).unwrap().len(), 2);
        assert_eq!(repo.list(Some(Priority::High), false).unwrap().len(), 1);
        assert_eq!(repo.list(Some(Priority::Low), false).unwrap().len(), 0);
    }
}
