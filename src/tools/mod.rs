//! Tool dispatch layer
//!
//! The [`Toolbox`] owns the repositories (and, when configured, the remote
//! calendar adapter) and executes named tools against them. Every tool
//! returns assistant-facing text; validation failures come back as formatted
//! error strings rather than `Err`, so the runtime can relay them verbatim.

pub mod schema;

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::calendar::CalendarService;
use crate::error::{Result, ValetError};
use crate::repo::{
    CompleteOutcome, ContactsRepo, ConversationsRepo, EventsRepo, NotesRepo, TodosRepo,
};
use crate::store::RecordStore;
use crate::timefmt;
use crate::types::{NewContact, NewEvent, NewNote, NewTodo, Priority};

const DEFAULT_LOOKAHEAD_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct ListEventsArgs {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    days: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ListTodosArgs {
    /// Raw priority so an unknown value can be echoed back
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    show_completed: bool,
}

#[derive(Debug, Deserialize)]
struct IdArgs {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct AddNoteArgs {
    title: String,
    content: String,
    #[serde(default)]
    tags: Option<TagsInput>,
}

/// Tag lists arrive either as a JSON array or, from older prompts, a single
/// comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

impl TagsInput {
    fn into_vec(self) -> Vec<String> {
        match self {
            TagsInput::List(tags) => tags,
            TagsInput::Csv(raw) => raw
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
struct ListNotesArgs {
    #[serde(default)]
    tag: Option<String>,
}

/// Executes named tools against the repositories.
#[derive(Clone)]
pub struct Toolbox {
    pub events: EventsRepo,
    pub todos: TodosRepo,
    pub notes: NotesRepo,
    pub contacts: ContactsRepo,
    pub conversations: ConversationsRepo,
    calendar: Option<Arc<CalendarService>>,
}

impl Toolbox {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self {
            events: EventsRepo::new(store.clone()),
            todos: TodosRepo::new(store.clone()),
            notes: NotesRepo::new(store.clone()),
            contacts: ContactsRepo::new(store.clone()),
            conversations: ConversationsRepo::new(store),
            calendar: None,
        }
    }

    pub fn with_calendar(mut self, calendar: Option<Arc<CalendarService>>) -> Self {
        self.calendar = calendar;
        self
    }

    /// Execute a tool by name. `Err` is reserved for unknown tools and
    /// malformed argument payloads; domain failures come back as text.
    pub fn dispatch(&self, name: &str, args: Value) -> Result<String> {
        match name {
            "schedule_event" => Ok(self.schedule_event(parse_args(args)?)),
            "list_events" => Ok(self.list_events(parse_args(args)?)),
            "add_todo" => Ok(self.add_todo(parse_args(args)?)),
            "list_todos" => Ok(self.list_todos(parse_args(args)?)),
            "complete_todo" => Ok(self.complete_todo(parse_args(args)?)),
            "add_note" => Ok(self.add_note(parse_args(args)?)),
            "list_notes" => Ok(self.list_notes(parse_args(args)?)),
            "get_note" => Ok(self.get_note(parse_args(args)?)),
            "find_note" => Ok(self.find_note(parse_args(args)?)),
            "add_contact" => Ok(self.add_contact(parse_args(args)?)),
            "find_contact" => Ok(self.find_contact(parse_args(args)?)),
            "list_contacts" => Ok(self.list_contacts()),
            "get_current_time" => Ok(self.get_current_time()),
            _ => Err(ValetError::InvalidInput(format!("Unknown tool: {name}"))),
        }
    }

    fn schedule_event(&self, input: NewEvent) -> String {
        let event = match self.events.schedule(&input) {
            Ok(event) => event,
            Err(e) => {
                return format!(
                    "Error: {}. Please provide date in YYYY-MM-DD format and time in HH:MM format.",
                    e.reason().trim_end_matches('.')
                )
            }
        };

        // Validated by schedule() just above.
        let when = timefmt::parse_datetime(&event.date, &event.time)
            .map(timefmt::spoken)
            .unwrap_or_else(|_| format!("{} {}", event.date, event.time));

        if let Some(calendar) = self.calendar.as_deref() {
            match calendar.insert(&event) {
                Ok(remote_id) => {
                    if let Err(e) = self.events.attach_external_id(event.id, &remote_id) {
                        debug!(error = %e, id = event.id, "failed to record remote calendar id");
                    }
                    return format!(
                        "Scheduled '{}' on {} via remote calendar.",
                        event.title, when
                    );
                }
                Err(e) => debug!(error = %e, "remote calendar insert failed, keeping local copy"),
            }
        }

        format!("Scheduled '{}' on {}.", event.title, when)
    }

    fn list_events(&self, args: ListEventsArgs) -> String {
        let start = match args.date.as_deref() {
            Some(raw) => match timefmt::parse_date(raw) {
                Ok(date) => Some(date),
                Err(_) => {
                    return "Error: Invalid date format. Please provide date in YYYY-MM-DD format."
                        .to_string()
                }
            },
            None => None,
        };
        let days = args.days.unwrap_or(DEFAULT_LOOKAHEAD_DAYS).max(1);

        if let Some(calendar) = self.calendar.as_deref() {
            let from = start.unwrap_or_else(|| timefmt::now_local().date());
            match calendar.events_between(from, days) {
                Ok(remote) => {
                    if remote.is_empty() {
                        return if args.date.is_some() {
                            "No events found in the remote calendar.".to_string()
                        } else {
                            "You have no scheduled events in the remote calendar.".to_string()
                        };
                    }
                    let mut out =
                        String::from("Here are your scheduled events from the remote calendar:\n\n");
                    for event in &remote {
                        let _ = writeln!(out, "- {} on {}", event.summary, event.start_spoken());
                        if !event.location.is_empty() {
                            let _ = writeln!(out, "  Location: {}", event.location);
                        }
                        if !event.description.is_empty() {
                            let _ = writeln!(out, "  Description: {}", event.description);
                        }
                    }
                    return out;
                }
                Err(e) => debug!(error = %e, "remote calendar list failed, falling back to local"),
            }
        }

        let events = match self.events.list(args.date.as_deref()) {
            Ok(events) => events,
            Err(e) => return format!("Error: {}", e.reason()),
        };
        if events.is_empty() {
            return if args.date.is_some() {
                "No events found.".to_string()
            } else {
                "You have no scheduled events.".to_string()
            };
        }

        let mut out = String::from("Here are your scheduled events:\n\n");
        for event in &events {
            let when = timefmt::parse_datetime(&event.date, &event.time)
                .map(timefmt::spoken)
                .unwrap_or_else(|_| format!("{} {}", event.date, event.time));
            let _ = writeln!(out, "- {} on {}", event.title, when);
            if !event.location.is_empty() {
                let _ = writeln!(out, "  Location: {}", event.location);
            }
            if !event.description.is_empty() {
                let _ = writeln!(out, "  Description: {}", event.description);
            }
        }
        out
    }

    fn add_todo(&self, input: NewTodo) -> String {
        match self.todos.add(&input) {
            Ok(todo) => {
                let due = todo
                    .due_date
                    .as_deref()
                    .map(|d| format!(" (due on {d})"))
                    .unwrap_or_default();
                format!(
                    "Added task '{}' with {} priority{} to your to-do list.",
                    todo.task, todo.priority, due
                )
            }
            Err(e) => format!("Error: {}", e.reason()),
        }
    }

    fn list_todos(&self, args: ListTodosArgs) -> String {
        let priority = match args.priority.as_deref() {
            Some(raw) => match raw.parse::<Priority>() {
                Ok(p) => Some(p),
                Err(msg) => return format!("Error: {msg}"),
            },
            None => None,
        };

        let todos = match self.todos.list(priority, args.show_completed) {
            Ok(todos) => todos,
            Err(e) => return format!("Error: {}", e.reason()),
        };
        if todos.is_empty() {
            return if args.priority.is_some() {
                "No tasks found.".to_string()
            } else {
                "Your to-do list is empty.".to_string()
            };
        }

        let mut out = String::from("Here are your to-do items:\n\n");
        for todo in &todos {
            let status = if todo.completed { "[✓]" } else { "[ ]" };
            let due = todo
                .due_date
                .as_deref()
                .map(|d| format!(" (due: {d})"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "{} {} {}{}",
                status,
                todo.priority.glyph(),
                todo.task,
                due
            );
        }
        out
    }

    fn complete_todo(&self, args: IdArgs) -> String {
        match self.todos.complete(args.id) {
            Ok(CompleteOutcome::Completed(todo)) => {
                format!("Marked task '{}' as completed.", todo.task)
            }
            Ok(CompleteOutcome::AlreadyCompleted(todo)) => {
                format!("Task '{}' is already marked as completed.", todo.task)
            }
            Err(e) => format!("Error: {}", e.reason()),
        }
    }

    fn add_note(&self, args: AddNoteArgs) -> String {
        let input = NewNote {
            title: args.title,
            content: args.content,
            tags: args.tags.map(TagsInput::into_vec).unwrap_or_default(),
        };
        match self.notes.add(&input) {
            Ok(note) => format!("Added note '{}' to your notes.", note.title),
            Err(e) => format!("Error adding note: {}", e.reason()),
        }
    }

    fn list_notes(&self, args: ListNotesArgs) -> String {
        let notes = match self.notes.list(args.tag.as_deref()) {
            Ok(notes) => notes,
            Err(e) => return format!("Error: {}", e.reason()),
        };
        if notes.is_empty() {
            return if args.tag.is_some() {
                "No notes found.".to_string()
            } else {
                "You have no notes.".to_string()
            };
        }

        let mut out = format!("You have {} notes:\n\n", notes.len());
        for note in &notes {
            let _ = writeln!(out, "- ID: {} - {}", note.id, note.title);
            if !note.tags.is_empty() {
                let _ = writeln!(out, "  Tags: {}", note.tags.join(", "));
            }
        }
        out
    }

    fn get_note(&self, args: IdArgs) -> String {
        let note = match self.notes.get(args.id) {
            Ok(note) => note,
            Err(e) => return format!("Error retrieving note: {}", e.reason()),
        };

        let mut out = format!("Title: {}\n", note.title);
        if !note.tags.is_empty() {
            let _ = writeln!(out, "Tags: {}", note.tags.join(", "));
        }
        let _ = writeln!(
            out,
            "Created: {}\n",
            note.created_at.format("%Y-%m-%d %H:%M:%S")
        );
        out.push_str(&note.content);
        out
    }

    fn find_note(&self, args: QueryArgs) -> String {
        let notes = match self.notes.search(&args.query) {
            Ok(notes) => notes,
            Err(e) => return format!("Error: {}", e.reason()),
        };
        if notes.is_empty() {
            return format!("No notes found matching '{}'.", args.query);
        }

        let mut out = format!("Found {} notes matching '{}':\n\n", notes.len(), args.query);
        for note in &notes {
            let _ = writeln!(out, "- ID: {} - {}", note.id, note.title);
            if !note.tags.is_empty() {
                let _ = writeln!(out, "  Tags: {}", note.tags.join(", "));
            }
            let preview = if note.content.chars().count() > 100 {
                let cut: String = note.content.chars().take(100).collect();
                format!("{cut}...")
            } else {
                note.content.clone()
            };
            let _ = writeln!(out, "  Preview: {preview}");
        }
        out
    }

    fn add_contact(&self, input: NewContact) -> String {
        match self.contacts.add(&input) {
            Ok(contact) => format!("Added contact '{}' to your contacts list.", contact.name),
            Err(e) => format!("Error adding contact: {}", e.reason()),
        }
    }

    fn find_contact(&self, args: QueryArgs) -> String {
        let contacts = match self.contacts.search(&args.query) {
            Ok(contacts) => contacts,
            Err(e) => return format!("Error: {}", e.reason()),
        };
        if contacts.is_empty() {
            return format!("No contacts found matching '{}'.", args.query);
        }

        let mut out = format!(
            "Found {} contacts matching '{}':\n\n",
            contacts.len(),
            args.query
        );
        for contact in &contacts {
            let _ = writeln!(out, "- {}", contact.name);
            if !contact.email.is_empty() {
                let _ = writeln!(out, "  Email: {}", contact.email);
            }
            if !contact.phone.is_empty() {
                let _ = writeln!(out, "  Phone: {}", contact.phone);
            }
            if !contact.address.is_empty() {
                let _ = writeln!(out, "  Address: {}", contact.address);
            }
            if !contact.notes.is_empty() {
                let _ = writeln!(out, "  Notes: {}", contact.notes);
            }
        }
        out
    }

    fn list_contacts(&self) -> String {
        let contacts = match self.contacts.list() {
            Ok(contacts) => contacts,
            Err(e) => return format!("Error: {}", e.reason()),
        };
        if contacts.is_empty() {
            return "You have no contacts.".to_string();
        }

        let mut out = format!("You have {} contacts:\n\n", contacts.len());
        for contact in &contacts {
            let _ = writeln!(out, "- {}", contact.name);
            if !contact.email.is_empty() {
                let _ = writeln!(out, "  Email: {}", contact.email);
            }
            if !contact.phone.is_empty() {
                let _ = writeln!(out, "  Phone: {}", contact.phone);
            }
        }
        out
    }

    fn get_current_time(&self) -> String {
        format!(
            "The current date and time is {}.",
            timefmt::spoken(timefmt::now_local())
        )
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| ValetError::InvalidInput(format!("Invalid tool arguments: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn toolbox(dir: &std::path::Path) -> Toolbox {
        Toolbox::new(Arc::new(RecordStore::open(dir).unwrap()))
    }

    #[test]
    fn schedule_event_confirms_with_spoken_datetime() {
        let dir = tempdir().unwrap();
        let tb = toolbox(dir.path());
        let reply = tb
            .dispatch(
                "schedule_event",
                json!({"date": "2024-03-01", "time": "14:30", "title": "Standup"}),
            )
            .unwrap();
        assert_eq!(
            reply,
            "Scheduled 'Standup' on Friday, March 01, 2024 at 02:30 PM."
        );
    }

    #[test]
    fn schedule_event_accepts_legacy_event_key() {
        let dir = tempdir().unwrap();
        let tb = toolbox(dir.path());
        let reply = tb
            .dispatch(
                "schedule_event",
                json!({"date": "2024-03-01", "time": "09:00", "event": "Dentist"}),
            )
            .unwrap();
        assert!(reply.starts_with("Scheduled 'Dentist'"));
    }

    #[test]
    fn schedule_event_reports_parse_failures() {
        let dir = tempdir().unwrap();
        let tb = toolbox(dir.path());
        let reply = tb
            .dispatch(
                "schedule_event",
                json!({"date": "03/01/2024", "time": "14:30", "title": "Standup"}),
            )
            .unwrap();
        assert!(reply.starts_with("Error: "));
        assert!(reply
            .ends_with("Please provide date in YYYY-MM-DD format and time in HH:MM format."));
    }

    #[test]
    fn list_events_filters_by_date() {
        let dir = tempdir().unwrap();
        let tb = toolbox(dir.path());
        tb.dispatch(
            "schedule_event",
            json!({"date": "2024-03-01", "time": "14:30", "title": "Standup"}),
        )
        .unwrap();
        tb.dispatch(
            "schedule_event",
            json!({"date": "2024-03-02", "time": "10:00", "title": "Review"}),
        )
        .unwrap();

        let reply = tb
            .dispatch("list_events", json!({"date": "2024-03-01"}))
            .unwrap();
        let lines: Vec<_> = reply.lines().filter(|l| l.starts_with("- ")).collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Standup"));

        let empty = tb
            .dispatch("list_events", json!({"date": "2024-04-01"}))
            .unwrap();
        assert_eq!(empty, "No events found.");
    }

    #[test]
    fn todo_lifecycle_messages() {
        let dir = tempdir().unwrap();
        let tb = toolbox(dir.path());

        let added = tb
            .dispatch("add_todo", json!({"task": "Buy groceries"}))
            .unwrap();
        assert_eq!(
            added,
            "Added task 'Buy groceries' with medium priority to your to-do list."
        );

        let listed = tb.dispatch("list_todos", json!({})).unwrap();
        assert!(listed.starts_with("Here are your to-do items:\n\n"));
        assert!(listed.contains("[ ] 🟡 Buy groceries"));

        let done = tb.dispatch("complete_todo", json!({"id": 1})).unwrap();
        assert_eq!(done, "Marked task 'Buy groceries' as completed.");
        let again = tb.dispatch("complete_todo", json!({"id": 1})).unwrap();
        assert_eq!(again, "Task 'Buy groceries' is already marked as completed.");

        let empty = tb.dispatch("list_todos", json!({})).unwrap();
        assert_eq!(empty, "Your to-do list is empty.");

        let missing = tb.dispatch("complete_todo", json!({"id": 99})).unwrap();
        assert_eq!(missing, "Error: No task found with ID 99.");
    }

    #[test]
    fn bad_priority_is_echoed_back() {
        let dir = tempdir().unwrap();
        let tb = toolbox(dir.path());
        let reply = tb
            .dispatch("add_todo", json!({"task": "x", "priority": "urgent"}))
            .unwrap();
        assert_eq!(
            reply,
            "Error: Priority must be 'low', 'medium', or 'high'. Got 'urgent'."
        );
    }

    #[test]
    fn note_tags_accept_csv_strings() {
        let dir = tempdir().unwrap();
        let tb = toolbox(dir.path());
        tb.dispatch(
            "add_note",
            json!({"title": "Kickoff", "content": "Minutes", "tags": "Project, q2"}),
        )
        .unwrap();
        let note = tb.notes.get(1).unwrap();
        assert_eq!(note.tags, vec!["Project", "q2"]);
    }

    #[test]
    fn find_note_previews_long_content() {
        let dir = tempdir().unwrap();
        let tb = toolbox(dir.path());
        let long = "x".repeat(150);
        tb.dispatch("add_note", json!({"title": "Big", "content": long}))
            .unwrap();

        let reply = tb.dispatch("find_note", json!({"query": "big"})).unwrap();
        assert!(reply.starts_with("Found 1 notes matching 'big':"));
        assert!(reply.contains(&format!("  Preview: {}...", "x".repeat(100))));
    }

    #[test]
    fn contact_messages() {
        let dir = tempdir().unwrap();
        let tb = toolbox(dir.path());
        let added = tb
            .dispatch(
                "add_contact",
                json!({"name": "Jane Doe", "email": "jane@example.com"}),
            )
            .unwrap();
        assert_eq!(added, "Added contact 'Jane Doe' to your contacts list.");

        let dup = tb
            .dispatch("add_contact", json!({"name": "JANE DOE"}))
            .unwrap();
        assert_eq!(
            dup,
            "Error adding contact: A contact with the name 'JANE DOE' already exists."
        );

        let found = tb
            .dispatch("find_contact", json!({"query": "jane"}))
            .unwrap();
        assert!(found.starts_with("Found 1 contacts matching 'jane':"));

        let none = tb
            .dispatch("find_contact", json!({"query": "bob"}))
            .unwrap();
        assert_eq!(none, "No contacts found matching 'bob'.");
    }

    #[test]
    fn current_time_has_spoken_shape() {
        let dir = tempdir().unwrap();
        let tb = toolbox(dir.path());
        let reply = tb.dispatch("get_current_time", json!({})).unwrap();
        assert!(reply.starts_with("The current date and time is "));
        assert!(reply.ends_with('.'));
        assert!(reply.contains(" at "));
    }

    #[test]
    fn unknown_tool_is_an_error() {
        let dir = tempdir().unwrap();
        let tb = toolbox(dir.path());
        assert!(tb.dispatch("teleport", json!({})).is_err());
    }
}
