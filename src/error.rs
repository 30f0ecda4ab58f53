// src/error.rs

//! Unified error handling for the trend harvester.

use std::fmt;

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// SQLite operation failed
    #[error("Storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A fetch failed in a way worth retrying (timeout, connect, 429/5xx)
    #[error("Transient fetch error: {0}")]
    Transient(String),

    /// A listing entry was missing a required field
    #[error("Malformed entry: missing or invalid {field}")]
    MalformedEntry { field: &'static str },

    /// A category's crawl was abandoned after repeated failures
    #[error("Crawl aborted for category '{category}': {message}")]
    CategoryAborted { category: String, message: String },

    /// The token classifier could not process the text
    #[error("Classifier error: {0}")]
    Classifier(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a malformed-entry error for a required field.
    pub fn malformed(field: &'static str) -> Self {
        Self::MalformedEntry { field }
    }

    /// Create a category-aborted error with context.
    pub fn aborted(category: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::CategoryAborted {
            category: category.into(),
            message: message.to_string(),
        }
    }

    /// Create a classifier error.
    pub fn classifier(message: impl Into<String>) -> Self {
        Self::Classifier(message.into())
    }
}
