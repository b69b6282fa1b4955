//! Error types for the monthly counter Lambda.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while answering a monthly count request.
#[derive(Error, Debug)]
pub enum Error {
    /// Required configuration is missing
    #[error("Configuration error: {0}")]
    Config(String),

    /// The Notion API answered with a non-success status
    #[error("Notion API error ({status}): {body}")]
    Remote { status: u16, body: String },

    /// Transport error talking to the Notion API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    ///
    /// Remote failures keep the status Notion returned.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Remote { status, .. } => *status,
            _ => 500,
        }
    }
}
