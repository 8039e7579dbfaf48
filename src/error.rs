use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to open input file {path}: {source}")]
    InputUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker {worker} failed to seek to offset {offset}: {source}")]
    Seek {
        worker: usize,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record at byte {offset}: {reason}")]
    MalformedRecord { offset: u64, reason: RecordError },

    #[error("Aggregation store lock poisoned")]
    StorePoisoned,

    #[error("Aggregation store still shared by {holders} handles")]
    StoreInUse { holders: usize },

    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Reasons a single line fails to become a record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("expected 2 fields, found {found}")]
    FieldCount { found: usize },

    #[error("invalid measurement '{text}'")]
    InvalidMeasurement { text: String },

    #[error("station name without measurement")]
    MissingMeasurement,
}
