//! Error handling module for dricfg
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the library should use these types for consistency.

use thiserror::Error;

/// Main error type for dricfg
#[derive(Error, Debug)]
pub enum DricfgError {
    /// IO errors (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Driver schema errors (malformed schema text, duplicate option names)
    #[error("Schema error: {0}")]
    Schema(String),

    /// Cross-store consistency violations (user data disagrees with schema)
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Validation errors (user input, option values)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Lookup misses for drivers, applications or options
    #[error("Not found: {0}")]
    NotFound(String),

    /// General errors (catch-all for edge cases)
    #[error("{0}")]
    General(String),
}

/// Result type alias for dricfg operations
pub type Result<T> = std::result::Result<T, DricfgError>;

// Convenient error constructors
impl DricfgError {
    /// Create a schema error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a consistency error
    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a general error
    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }
}
