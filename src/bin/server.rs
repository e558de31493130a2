//! Valet MCP server
//!
//! Run with: valet-server

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use valet::calendar::CalendarService;
use valet::error::Result;
use valet::mcp::{StdioServer, ToolHandler, ToolSpec};
use valet::store::RecordStore;
use valet::tools::{schema, Toolbox};

#[derive(Parser, Debug)]
#[command(name = "valet-server")]
#[command(about = "Valet MCP server for personal assistant tools")]
struct Args {
    /// Data directory for the JSON collections
    #[arg(long, env = "VALET_DATA_DIR", default_value = "~/.local/share/valet")]
    data_dir: String,

    /// Directory holding the remote calendar credentials
    #[arg(long, env = "VALET_CREDENTIALS_DIR", default_value = "credentials")]
    credentials_dir: String,

    /// Override the remote calendar base URL
    #[arg(long, env = "VALET_CALENDAR_BASE_URL")]
    calendar_base_url: Option<String>,

    /// Disable the remote calendar even when credentials exist
    #[arg(long, env = "VALET_NO_CALENDAR")]
    no_calendar: bool,
}

struct ValetHandler {
    toolbox: Toolbox,
}

impl ToolHandler for ValetHandler {
    fn server_name(&self) -> &str {
        "valet"
    }

    fn tools(&self) -> Vec<ToolSpec> {
        schema::tool_specs()
    }

    fn call(&self, name: &str, arguments: Value) -> Result<String> {
        self.toolbox.dispatch(name, arguments)
    }
}

fn main() -> Result<()> {
    // Logging to stderr; stdout carries the protocol
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let data_dir = shellexpand::tilde(&args.data_dir).to_string();
    let store = Arc::new(RecordStore::open(Path::new(&data_dir))?);

    let calendar = if args.no_calendar {
        None
    } else {
        let credentials_dir = shellexpand::tilde(&args.credentials_dir).to_string();
        match CalendarService::discover(
            Path::new(&credentials_dir),
            args.calendar_base_url.as_deref(),
        ) {
            Ok(service) => service.map(Arc::new),
            Err(e) => {
                tracing::warn!(error = %e, "remote calendar unavailable, using local storage");
                None
            }
        }
    };

    let toolbox = Toolbox::new(store).with_calendar(calendar);
    tracing::info!(data_dir, "valet MCP server starting");

    StdioServer::new(ValetHandler { toolbox }).run()
}
