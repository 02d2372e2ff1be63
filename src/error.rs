//! Error types for Wellness Insights
//!
//! The analytics themselves never fail; these errors only surface at the
//! edges: parsing rows, resolving configuration, and delivering reminders.

use crate::schema::ValidationError;
use thiserror::Error;

/// Errors that can occur at the I/O boundary of the engine
#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("Failed to parse input rows: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid row: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Reminder service is not running")]
    ServiceNotInitialized,

    #[error("Failed to send notification: {0}")]
    NotificationFailed(String),
}
