//! Error types shared across ferronet crates

use thiserror::Error;

/// Result type alias for ferronet operations
pub type Result<T> = std::result::Result<T, FerronetError>;

/// Main error type for ferronet
#[derive(Error, Debug)]
pub enum FerronetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown identifier type: {0}")]
    InvalidIdentifierType(String),

    #[error("Unknown node type: {0}")]
    InvalidNodeType(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
