//! Error types for syncdiff operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncDiffError>;

#[derive(Error, Debug)]
pub enum SyncDiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Progress reporter has already been closed")]
    ReporterClosed,

    #[error("Progress reporter is still running; close it first")]
    ReporterNotClosed,

    #[error("Progress worker thread panicked")]
    WorkerPanicked,

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl SyncDiffError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }
}
