use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Invalid search status: '{0}' (expected pending, processing, completed or failed)")]
    InvalidStatus(String),

    #[error("Malformed {shape} entry #{index}: {reason}")]
    ShapeMismatch {
        shape: &'static str,
        index: usize,
        reason: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Upstream(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ScoutError>;
