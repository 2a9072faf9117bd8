use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Invalid file filter: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("All API keys are invalid or over their monthly limit")]
    CredentialsExhausted,

    #[error("No API keys configured. Pass --keys or set apiKeyList in the config file")]
    NoCredentials,

    #[error("Invalid minimum compress percent: {0}. Must be between 0 and 100")]
    InvalidCompressPercent(f64),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, CompressionError>;
