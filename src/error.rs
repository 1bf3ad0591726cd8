//! Error types for tyrantkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using TyrantError
pub type Result<T> = std::result::Result<T, TyrantError>;

/// Unified error type for tyrantkv operations
#[derive(Debug, Error)]
pub enum TyrantError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    /// The socket failed mid read or write. The connection must be discarded.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// The server answered with a nonzero status byte.
    #[error("Protocol error: server returned status code {0}")]
    Protocol(u8),

    #[error("Key not found: {}", String::from_utf8_lossy(.0))]
    KeyNotFound(Vec<u8>),

    /// A bulk get returned fewer values than keys under the legacy response shape.
    #[error("Unusable response: {0}")]
    UnusableResponse(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TyrantError {
    /// True if the error came from the socket rather than the server
    pub fn is_transport(&self) -> bool {
        matches!(self, TyrantError::Io(_))
    }

    /// True if the server rejected the request with a status code
    pub fn is_protocol(&self) -> bool {
        matches!(self, TyrantError::Protocol(_))
    }

    /// The raw server status code, if any
    pub fn status_code(&self) -> Option<u8> {
        match self {
            TyrantError::Protocol(code) => Some(*code),
            _ => None,
        }
    }
}
