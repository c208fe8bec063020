//! Error taxonomy shared by the request engine and the lifecycle monitor.
//!
//! Pure derivation (config edits, endpoint synthesis, sample payloads) never
//! produces these; it degrades to a safe default instead.

use serde_json::json;
use thiserror::Error;

use crate::models::ControlAction;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsoleError {
    /// The external call could not be reached or did not answer in time
    #[error("Connection error: {0}")]
    Connection(String),

    /// A `{param}` placeholder in the path got no value
    #[error("Missing value for path parameter '{0}'")]
    MissingParameter(String),

    #[error("Invalid configuration for entity '{entity}': {reason}")]
    InvalidConfiguration { entity: String, reason: String },

    #[error("Server {action} failed: {message}")]
    ServerControlFailure {
        action: ControlAction,
        message: String,
    },

    #[error("Request failed: {0}")]
    RequestFailure(String),
}

impl ConsoleError {
    /// Short title used as the `error` member of the display block
    pub fn title(&self) -> &'static str {
        match self {
            ConsoleError::Connection(_) => "Connection error",
            ConsoleError::MissingParameter(_) => "Missing parameter",
            ConsoleError::InvalidConfiguration { .. } => "Invalid configuration",
            ConsoleError::ServerControlFailure { .. } => "Server control failure",
            ConsoleError::RequestFailure(_) => "Request failed",
        }
    }

    /// Human readable detail without the title prefix
    pub fn details(&self) -> String {
        match self {
            ConsoleError::Connection(msg) | ConsoleError::RequestFailure(msg) => msg.clone(),
            ConsoleError::MissingParameter(name) => {
                format!("No value supplied for path parameter '{}'", name)
            }
            ConsoleError::InvalidConfiguration { entity, reason } => {
                format!("{}: {}", entity, reason)
            }
            ConsoleError::ServerControlFailure { action, message } => {
                format!("{} failed: {}", action, message)
            }
        }
    }

    /// Structured `{error, details}` block shown in the response area
    pub fn error_block(&self) -> String {
        let block = json!({
            "error": self.title(),
            "details": self.details(),
        });
        serde_json::to_string_pretty(&block).unwrap_or_else(|_| self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
