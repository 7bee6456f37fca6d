//! Error types for dayglance-core

use thiserror::Error;

/// Main error type for the dayglance-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Record store failure (lock poisoning, unavailable backend)
    #[error("record store error: {0}")]
    Store(String),

    /// Async runtime failure (runtime construction, joined task panicked)
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Record not found
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },
}

/// Result type alias for dayglance-core
pub type Result<T> = std::result::Result<T, Error>;
