//! Error types for adapters.

use thiserror::Error;

/// Errors that can occur when talking to a status service or upstream source.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The server answered with a non-success status code.
    #[error("received response code {code} ({reason})")]
    Status { code: u16, reason: &'static str },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl AdapterError {
    /// Build a [`AdapterError::Status`] with the canonical reason phrase.
    pub fn status(code: u16) -> Self {
        AdapterError::Status {
            code,
            reason: crate::status_reason(code),
        }
    }

    /// The HTTP status code, for errors where the server did answer.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AdapterError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else if err.is_decode() {
            AdapterError::Parse(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}
