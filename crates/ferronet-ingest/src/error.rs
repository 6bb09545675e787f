//! Error types for source loading, external services and persistence

use std::path::PathBuf;
use thiserror::Error;

/// Result type for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("KGML error: {0}")]
    Kgml(#[from] quick_xml::DeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Required input not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Required table '{table}' missing from {}", .path.display())]
    MissingTable { path: PathBuf, table: String },

    #[error("ID mapping job {job_id} ended with status {status}")]
    JobFailed { job_id: String, status: String },

    #[error("ID mapping job {job_id} still running after {polls} polls")]
    PollLimitExceeded { job_id: String, polls: u32 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Service returned {status} for {url}")]
    Service { url: String, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Common(#[from] ferronet_common::FerronetError),
}

impl IngestError {
    pub fn parse(msg: impl Into<String>) -> Self {
        IngestError::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        IngestError::Config(msg.into())
    }
}
