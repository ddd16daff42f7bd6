//! Unified error types for offcache.
//!
//! Every variant carries a stable code prefix so hosts can match on the
//! message without parsing the rest of it.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the offcache agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an empty method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid or unsupported URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored entry could not be decoded back into a response.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// The named cache generation does not exist.
    #[error("GENERATION_MISSING: {0}")]
    GenerationMissing(String),

    /// The network request was rejected before a response arrived.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptEntry(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::GenerationMissing(label) => (-32001, format!("no cache generation named {label}")),
            Error::Network(msg) => (-32008, msg.clone()),
            Error::FetchTooLarge(msg) => (-32007, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) | Error::CorruptEntry(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
