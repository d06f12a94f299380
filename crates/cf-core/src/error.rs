//! Error types for CueForge

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias
pub type CfResult<T> = Result<T, CfError>;
