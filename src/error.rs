// src/error.rs

//! Unified error handling for the cert tracker.

use std::fmt;

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A write would break a unique constraint
    #[error("{field} must be unique")]
    Unique { field: String },

    /// Lookup by id, path or route found nothing
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Caller broke a precondition
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[cfg(feature = "opengraph")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Page metadata could not be extracted
    #[error("OpenGraph error for {url}: {message}")]
    OpenGraph { url: String, message: String },
}

impl AppError {
    /// Create a uniqueness violation for the given field label.
    pub fn unique(field: impl Into<String>) -> Self {
        Self::Unique {
            field: field.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Create a precondition error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an OpenGraph extraction error.
    pub fn opengraph(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::OpenGraph {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// The colliding field label, if this is a uniqueness violation.
    pub fn unique_field(&self) -> Option<&str> {
        match self {
            Self::Unique { field } => Some(field),
            _ => None,
        }
    }

    /// Whether this error is a missing-record lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
