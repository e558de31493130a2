//! Error types for valet

use thiserror::Error;

/// Result type alias for valet operations
pub type Result<T> = std::result::Result<T, ValetError>;

/// Main error type for valet
#[derive(Error, Debug)]
pub enum ValetError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No {entity} found with ID {id}.")]
    NotFound { entity: &'static str, id: i64 },

    #[error("A contact with the name '{0}' already exists.")]
    DuplicateName(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Calendar error: {0}")]
    Calendar(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ValetError {
    /// Check if the operation may succeed when tried again
    pub fn is_retryable(&self) -> bool {
        matches!(self, ValetError::Calendar(_) | ValetError::Http(_))
    }

    /// Get error code for the JSON-RPC surface
    pub fn code(&self) -> i64 {
        match self {
            ValetError::NotFound { .. } => -32001,
            ValetError::InvalidInput(_) => -32602,
            ValetError::DuplicateName(_) => -32006,
            _ => -32000,
        }
    }

    /// The bare reason, without the variant prefix.
    ///
    /// Tool responses splice this into the original assistant phrasing
    /// ("Error: ...", "Error adding contact: ...") rather than exposing the
    /// internal taxonomy.
    pub fn reason(&self) -> String {
        match self {
            ValetError::InvalidInput(msg) => msg.clone(),
            ValetError::NotFound { entity, id } => format!("No {entity} found with ID {id}."),
            ValetError::DuplicateName(name) => {
                format!("A contact with the name '{name}' already exists.")
            }
            other => other.to_string(),
        }
    }
}
