//! Valet web chat server
//!
//! Run with: valet-web

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use valet::agent::{Agent, AgentConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use valet::calendar::CalendarService;
use valet::error::{Result, ValetError};
use valet::store::RecordStore;
use valet::tools::Toolbox;

#[derive(Parser, Debug)]
#[command(name = "valet-web")]
#[command(about = "Valet web chat server")]
struct Args {
    /// Data directory for the JSON collections
    #[arg(long, env = "VALET_DATA_DIR", default_value = "~/.local/share/valet")]
    data_dir: String,

    /// Directory holding the remote calendar credentials
    #[arg(long, env = "VALET_CREDENTIALS_DIR", default_value = "credentials")]
    credentials_dir: String,

    /// OpenAI-compatible API key
    #[arg(long, env = "OPENAI_API_KEY")]
    api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[arg(long, env = "VALET_OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    openai_base_url: String,

    /// Chat model name
    #[arg(long, env = "VALET_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Port to listen on
    #[arg(long, env = "VALET_WEB_PORT", default_value = "5000")]
    port: u16,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let api_key = args.api_key.ok_or_else(|| {
        ValetError::Config(
            "OPENAI_API_KEY is not set; the web chat server cannot start".to_string(),
        )
    })?;

    let data_dir = shellexpand::tilde(&args.data_dir).to_string();
    let store = Arc::new(RecordStore::open(Path::new(&data_dir))?);

    let credentials_dir = shellexpand::tilde(&args.credentials_dir).to_string();
    let calendar = match CalendarService::discover(Path::new(&credentials_dir), None) {
        Ok(service) => service.map(Arc::new),
        Err(e) => {
            tracing::warn!(error = %e, "remote calendar unavailable, using local storage");
            None
        }
    };

    let toolbox = Toolbox::new(store).with_calendar(calendar);
    let config = AgentConfig {
        api_key,
        base_url: args.openai_base_url,
        model: args.model,
    };
    let agent = Arc::new(Agent::new(config, toolbox)?);

    // The agent is blocking HTTP; the runtime stays explicit so handlers can
    // push agent calls onto the blocking pool.
    let runtime = tokio::runtime::Runtime::new()?;
    runtime
        .block_on(valet::web::serve(agent, args.port))
        .map_err(ValetError::from)
}
