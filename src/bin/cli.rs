//! Valet CLI
//!
//! Command-line interface over the same tools the agent runtime calls.

use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use valet::error::Result;
use valet::store::RecordStore;
use valet::tools::Toolbox;

#[derive(Parser)]
#[command(name = "valet")]
#[command(about = "Personal assistant CLI")]
#[command(version)]
struct Cli {
    /// Data directory for the JSON collections
    #[arg(long, env = "VALET_DATA_DIR", default_value = "~/.local/share/valet")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule an event
    Schedule {
        /// Date in YYYY-MM-DD format
        date: String,
        /// Time in HH:MM format
        time: String,
        /// Event title
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        location: Option<String>,
        /// Duration in minutes
        #[arg(long)]
        duration: Option<i64>,
    },
    /// List events
    Events {
        /// Only events on this date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Add a to-do item
    Todo {
        /// Task description
        task: String,
        /// Priority (low, medium, high)
        #[arg(short, long)]
        priority: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },
    /// List to-do items
    Todos {
        /// Filter by priority
        #[arg(short, long)]
        priority: Option<String>,
        /// Include completed tasks
        #[arg(short, long)]
        all: bool,
    },
    /// Mark a to-do item as completed
    Done {
        /// Task ID
        id: i64,
    },
    /// Add a note
    Note {
        /// Note title
        title: String,
        /// Note content
        content: String,
        /// Tags (comma-separated)
        #[arg(short, long)]
        tags: Option<String>,
    },
    /// List notes
    Notes {
        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,
    },
    /// Show a note by ID
    Show {
        /// Note ID
        id: i64,
    },
    /// Search notes
    FindNote {
        /// Search query
        query: String,
    },
    /// Add a contact
    Contact {
        /// Contact name
        name: String,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        phone: Option<String>,
        #[arg(short, long)]
        address: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Search contacts
    FindContact {
        /// Search query
        query: String,
    },
    /// List all contacts
    Contacts,
    /// Show the current date and time
    Now,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let data_dir = shellexpand::tilde(&cli.data_dir).to_string();
    let store = Arc::new(RecordStore::open(Path::new(&data_dir))?);
    let toolbox = Toolbox::new(store);

    let (tool, args) = match cli.command {
        Commands::Schedule {
            date,
            time,
            title,
            description,
            location,
            duration,
        } => (
            "schedule_event",
            json!({
                "date": date, "time": time, "title": title,
                "description": description, "location": location,
                "duration_minutes": duration,
            }),
        ),
        Commands::Events { date } => ("list_events", json!({ "date": date })),
        Commands::Todo {
            task,
            priority,
            due,
        } => (
            "add_todo",
            json!({ "task": task, "priority": priority, "due_date": due }),
        ),
        Commands::Todos { priority, all } => (
            "list_todos",
            json!({ "priority": priority, "show_completed": all }),
        ),
        Commands::Done { id } => ("complete_todo", json!({ "id": id })),
        Commands::Note {
            title,
            content,
            tags,
        } => (
            "add_note",
            json!({ "title": title, "content": content, "tags": tags }),
        ),
        Commands::Notes { tag } => ("list_notes", json!({ "tag": tag })),
        Commands::Show { id } => ("get_note", json!({ "id": id })),
        Commands::FindNote { query } => ("find_note", json!({ "query": query })),
        Commands::Contact {
            name,
            email,
            phone,
            address,
            notes,
        } => (
            "add_contact",
            json!({
                "name": name, "email": email, "phone": phone,
                "address": address, "notes": notes,
            }),
        ),
        Commands::FindContact { query } => ("find_contact", json!({ "query": query })),
        Commands::Contacts => ("list_contacts", json!({})),
        Commands::Now => ("get_current_time", json!({})),
    };

    println!("{}", toolbox.dispatch(tool, args)?);
    Ok(())
}
