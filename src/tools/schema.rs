//! Tool definitions exposed to the agent runtime

use crate::mcp::ToolSpec;

/// All tool definitions: (name, description, input schema)
pub const TOOL_DEFINITIONS: &[(&str, &str, &str)] = &[
    (
        "schedule_event",
        "Schedule an event on a specific date and time.",
        r#"{
            "type": "object",
            "properties": {
                "date": {"type": "string", "description": "The date in YYYY-MM-DD format"},
                "time": {"type": "string", "description": "The time in HH:MM format"},
                "title": {"type": "string", "description": "The name or title of the event"},
                "description": {"type": "string", "description": "Optional detailed description of the event"},
                "location": {"type": "string", "description": "Optional location of the event"},
                "duration_minutes": {"type": "integer", "description": "Optional duration of the event in minutes (default: 60)"}
            },
            "required": ["date", "time", "title"]
        }"#,
    ),
    (
        "list_events",
        "List scheduled events, optionally filtered by date.",
        r#"{
            "type": "object",
            "properties": {
                "date": {"type": "string", "description": "Optional date in YYYY-MM-DD format to filter events"},
                "days": {"type": "integer", "description": "Optional number of days to look ahead (default: 7)"}
            }
        }"#,
    ),
    (
        "add_todo",
        "Add a task to the to-do list.",
        r#"{
            "type": "object",
            "properties": {
                "task": {"type": "string", "description": "The task description"},
                "priority": {"type": "string", "enum": ["low", "medium", "high"], "description": "The priority level (default: medium)"},
                "due_date": {"type": "string", "description": "Optional due date in YYYY-MM-DD format"}
            },
            "required": ["task"]
        }"#,
    ),
    (
        "list_todos",
        "List tasks in the to-do list, optionally filtered by priority.",
        r#"{
            "type": "object",
            "properties": {
                "priority": {"type": "string", "enum": ["low", "medium", "high"], "description": "Optional priority level to filter tasks"},
                "show_completed": {"type": "boolean", "default": false, "description": "Whether to include completed tasks"}
            }
        }"#,
    ),
    (
        "complete_todo",
        "Mark a task as completed.",
        r#"{
            "type": "object",
            "properties": {
                "id": {"type": "integer", "description": "The ID of the task to mark as completed"}
            },
            "required": ["id"]
        }"#,
    ),
    (
        "add_note",
        "Add a note with a title and content.",
        r#"{
            "type": "object",
            "properties": {
                "title": {"type": "string", "description": "The title of the note"},
                "content": {"type": "string", "description": "The content of the note"},
                "tags": {"type": "array", "items": {"type": "string"}, "description": "Optional tags for the note"}
            },
            "required": ["title", "content"]
        }"#,
    ),
    (
        "list_notes",
        "List all notes, optionally filtered by tag.",
        r#"{
            "type": "object",
            "properties": {
                "tag": {"type": "string", "description": "Optional tag to filter notes"}
            }
        }"#,
    ),
    (
        "get_note",
        "Get a note by its ID.",
        r#"{
            "type": "object",
            "properties": {
                "id": {"type": "integer", "description": "The ID of the note to retrieve"}
            },
            "required": ["id"]
        }"#,
    ),
    (
        "find_note",
        "Search for notes by title, content, or tags.",
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "The search query"}
            },
            "required": ["query"]
        }"#,
    ),
    (
        "add_contact",
        "Add a contact to your contacts list.",
        r#"{
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "The name of the contact"},
                "email": {"type": "string", "description": "Optional email address of the contact"},
                "phone": {"type": "string", "description": "Optional phone number of the contact"},
                "address": {"type": "string", "description": "Optional address of the contact"},
                "notes": {"type": "string", "description": "Optional additional notes about the contact"}
            },
            "required": ["name"]
        }"#,
    ),
    (
        "find_contact",
        "Search for contacts by name, email, phone, or address.",
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "The search query"}
            },
            "required": ["query"]
        }"#,
    ),
    (
        "list_contacts",
        "List all contacts.",
        r#"{
            "type": "object",
            "properties": {}
        }"#,
    ),
    (
        "get_current_time",
        "Get the current date and time.",
        r#"{
            "type": "object",
            "properties": {}
        }"#,
    ),
];

/// All tool definitions as ToolSpec structs
pub fn tool_specs() -> Vec<ToolSpec> {
    TOOL_DEFINITIONS
        .iter()
        .map(|(name, description, schema)| ToolSpec {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::from_str(schema).expect("static tool schema is valid JSON"),
        })
        .collect()
}
