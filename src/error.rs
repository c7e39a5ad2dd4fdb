//! Error types and result handling for pg-decoding-json.
//!
//! This module defines the main error type [`Error`] and a convenience
//! [`Result`] type alias used throughout the crate.
//!
//! Contract violations by the host (an unknown change kind, a malformed
//! boolean text) are not represented here: the first cannot be expressed
//! through [`RowChange`](crate::decoding::RowChange), the second is
//! rendered as `false` with a diagnostic.
//!
//! # Example
//!
//! ```rust
//! use pg_decoding_json::{Error, Result};
//!
//! fn lookup_namespace(relid: u32) -> Result<String> {
//!     Err(Error::Catalog(format!("cache lookup failed for relation {}", relid)))
//! }
//!
//! match lookup_namespace(16384) {
//!     Ok(ns) => println!("namespace {}", ns),
//!     Err(Error::Catalog(msg)) => eprintln!("catalog error: {}", msg),
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use thiserror::Error;

/// The main error type for pg-decoding-json operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error, typically from an invalid file or environment variable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The host catalog could not resolve a relation or namespace.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// A type output function (or detoast) failed for a column value.
    #[error("Type output error for type {type_oid}: {message}")]
    TypeOutput {
        /// Type OID whose output function failed
        type_oid: u32,
        /// Description of the failure
        message: String,
    },

    /// A callback was invoked before `startup` or after `shutdown`.
    #[error("Decoding stream not started")]
    NotStarted,

    /// Invalid or malformed replication message.
    #[error("Invalid message format: {message}")]
    InvalidMessage {
        /// Description of what was invalid
        message: String,
    },

    /// JSON serialization error when encoding markers or checkpoints.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error, typically from capture or checkpoint file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Graceful shutdown was requested (e.g., via Ctrl+C).
    ///
    /// Uses the error mechanism to leave the replay loop early.
    #[error("Shutdown requested")]
    Shutdown,
}

impl Error {
    pub(crate) fn invalid_message(message: impl Into<String>) -> Self {
        Error::InvalidMessage {
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// A convenient Result type alias for pg-decoding-json operations.
///
/// This is equivalent to `std::result::Result<T, pg_decoding_json::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
