//! Storage and configuration errors shared by the server and its tests
//!
//! HTTP mapping lives in `bookclub-server`'s `ApiError`; only `NotFound`
//! becomes a 404 there, everything else is a 500.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Query, pool or schema failure from SQLite
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Root folder or log file could not be created or read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Discussion questions column holds invalid JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML file unreadable or an API credential missing
    #[error("Configuration error: {0}")]
    Config(String),

    /// Book, discussion or meeting id with no row
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row vanished between write and read-back
    #[error("Internal error: {0}")]
    Internal(String),
}
