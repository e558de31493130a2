//! Persistence properties of the record store and repositories

use std::sync::Arc;

use chrono::Utc;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use valet::repo::{EventsRepo, NotesRepo, TodosRepo};
use valet::store::{LoadOrigin, Loaded, RecordStore};
use valet::types::{Event, NewEvent, NewNote, NewTodo};

#[test]
fn events_round_trip_with_deep_equality() {
    let dir = tempdir().unwrap();
    let store = RecordStore::open(dir.path()).unwrap();
    let records = vec![Event {
        id: 1,
        title: "Standup".to_string(),
        description: "Daily sync".to_string(),
        location: "Room 2".to_string(),
        date: "2024-03-01".to_string(),
        time: "14:30".to_string(),
        duration_minutes: 30,
        created_at: Utc::now(),
        external_id: Some("remote-1".to_string()),
    }];

    store.save("events", &records).unwrap();
    let loaded: Loaded<Event> = store.load("events").unwrap();
    assert_eq!(loaded.records, records);
    assert_eq!(loaded.origin, LoadOrigin::File);
}

#[test]
fn documents_are_pretty_printed() {
    let dir = tempdir().unwrap();
    let repo = TodosRepo::new(Arc::new(RecordStore::open(dir.path()).unwrap()));
    repo.add(&NewTodo {
        task: "Indent me".to_string(),
        priority: None,
        due_date: None,
    })
    .unwrap();

    let raw = std::fs::read_to_string(dir.path().join("todos.json")).unwrap();
    assert!(raw.contains("\n  "));
}

#[test]
fn corrupt_collection_is_quarantined_not_erased() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("notes.json"), "{definitely not json").unwrap();

    let repo = NotesRepo::new(Arc::new(RecordStore::open(dir.path()).unwrap()));
    let notes = repo.list(None).unwrap();
    assert!(notes.is_empty());

    // The bad bytes survive under a .corrupt name
    let aside = std::fs::read_to_string(dir.path().join("notes.json.corrupt")).unwrap();
    assert_eq!(aside, "{definitely not json");

    // And the collection is usable again
    repo.add(&NewNote {
        title: "Fresh".to_string(),
        content: "start".to_string(),
        tags: vec![],
    })
    .unwrap();
    assert_eq!(repo.list(None).unwrap().len(), 1);
}

#[test]
fn write_replaces_the_whole_document() {
    let dir = tempdir().unwrap();
    let store = Arc::new(RecordStore::open(dir.path()).unwrap());
    let repo = EventsRepo::new(store);

    repo.schedule(&NewEvent {
        date: "2024-03-01".to_string(),
        time: "09:00".to_string(),
        title: "First".to_string(),
        ..Default::default()
    })
    .unwrap();
    let first = repo.schedule(&NewEvent {
        date: "2024-03-02".to_string(),
        time: "09:00".to_string(),
        title: "Second".to_string(),
        ..Default::default()
    })
    .unwrap();
    repo.delete(1).unwrap();

    // No stale temp files, one clean document left behind
    let raw = std::fs::read_to_string(dir.path().join("events.json")).unwrap();
    let parsed: Vec<Event> = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].id, first.id);

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| !n.ends_with(".json"))
        .collect();
    assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
}

#[test]
fn ids_survive_store_reopen() {
    let dir = tempdir().unwrap();
    {
        let repo = TodosRepo::new(Arc::new(RecordStore::open(dir.path()).unwrap()));
        repo.add(&NewTodo {
            task: "one".to_string(),
            priority: None,
            due_date: None,
        })
        .unwrap();
        repo.add(&NewTodo {
            task: "two".to_string(),
            priority: None,
            due_date: None,
        })
        .unwrap();
    }

    // Delete everything, reopen, and ids still move forward
    std::fs::remove_file(dir.path().join("todos.json")).unwrap();
    let repo = TodosRepo::new(Arc::new(RecordStore::open(dir.path()).unwrap()));
    let todo = repo
        .add(&NewTodo {
            task: "three".to_string(),
            priority: None,
            due_date: None,
        })
        .unwrap();
    assert_eq!(todo.id, 3);
}
