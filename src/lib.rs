//! Valet - personal assistant core
//!
//! JSON-backed repositories for events, todos, notes, contacts, and
//! conversation history, exposed to an LLM runtime as named tools over MCP,
//! with an optional remote calendar adapter and a web chat surface.

pub mod agent;
pub mod calendar;
pub mod error;
pub mod mcp;
pub mod repo;
pub mod store;
pub mod timefmt;
pub mod tools;
pub mod types;
pub mod web;

pub use error::{Result, ValetError};
pub use store::RecordStore;
pub use tools::Toolbox;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
