use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedpackError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Persistence unavailable: {0}")]
    Unsupported(String),
    #[error("Store '{0}' is not open")]
    StoreClosed(String),
    #[error("Store '{store}' holds {count} packages; expected at most one")]
    IntegrityViolation { store: String, count: usize },
    #[error("Package has no id; add or seed it before updating")]
    MissingPackageId,
    #[error("A comment with timestamp {0} already exists")]
    DuplicateComment(i64),
    #[error("Store schema version {found} is newer than supported version {supported}")]
    SchemaVersion { found: i64, supported: i64 },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
}
