//! Error types for the Ingestion Service

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    HttpStatus {
        status: u16,
        body: String,
    },

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("API error: {code} - {message}")]
    ApiError {
        code: String,
        message: String,
    },

    #[error("Source not configured: {0}")]
    SourceNotConfigured(String),

    #[error("Duplicate identity key: {source_api}/{external_id}")]
    DuplicateKey {
        source_api: String,
        external_id: String,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Shutdown requested")]
    ShutdownRequested,
}

impl IngestionError {
    /// True when the error is a uniqueness conflict on the identity key
    pub fn is_conflict(&self) -> bool {
        matches!(self, IngestionError::DuplicateKey { .. })
    }

    /// Short, stable label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            IngestionError::HttpError(e) if e.is_timeout() => "timeout",
            IngestionError::HttpError(_) => "http",
            IngestionError::HttpStatus { .. } => "http_status",
            IngestionError::JsonError(_) => "json",
            IngestionError::DatabaseError(_) => "database",
            IngestionError::ConfigError(_) => "config",
            IngestionError::ApiError { .. } => "upstream_envelope",
            IngestionError::SourceNotConfigured(_) => "not_configured",
            IngestionError::DuplicateKey { .. } => "conflict",
            IngestionError::ParseError(_) => "parse",
            IngestionError::StorageError(_) => "storage",
            IngestionError::ShutdownRequested => "shutdown",
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestionError>;
