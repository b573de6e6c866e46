use std::path::PathBuf;

use thiserror::Error;

/// Main application error type that encompasses all fatal failure modes.
///
/// Per-record violations are not represented here: those are collected as
/// plain messages in the run report. This enum covers startup failures
/// (missing or corrupt contracts), transport failures during identifier
/// lookup, and internal faults.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status error: {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timeout: {url} after {timeout_seconds} seconds")]
    Timeout { url: String, timeout_seconds: u64 },

    #[error("Schema load error: {path} - {reason}")]
    SchemaLoad { path: PathBuf, reason: String },

    #[error("Vocabulary load error: '{name}' - {reason}")]
    VocabularyLoad { name: String, reason: String },

    #[error("Malformed lookup response: {details}")]
    LookupResponse { details: String },

    #[error("Migration error: {path} - {reason}")]
    Migration { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidationError>;
