//! Error types for cost-sentinel
//!
//! There are two error types: `SentinelError` (main error enum) and
//! `ConfigError` (configuration-specific).
//!
//! ## Error Handling Philosophy
//!
//! Library code uses `crate::error::Result<T>` which returns `SentinelError`.
//! The binary uses `anyhow::Result<T>` and converts at the CLI boundary so the
//! full error chain is kept.
//!
//! Provider failures (listing, metrics, pricing catalog) are never fatal to a
//! scan. Scanners catch them at the call site, record a diagnostic and carry on
//! with an empty result. Only configuration errors reach the user as a failure,
//! and they do so at scanner construction, before any provider call is made.
//!
//! ## Retry Awareness
//!
//! Errors implement `IsRetryable`. The `RetryPolicy` in `src/retry.rs` only
//! retries `CloudProvider` (throttling-class SDK errors), `Io` and `Retryable`.
//! Access denied and other service errors surface as `Aws` and are not
//! retried: they will not succeed on the second attempt either.

use thiserror::Error;

/// Main error type for cost-sentinel
#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cloud provider error: {provider} - {message}")]
    CloudProvider {
        provider: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Retryable error (attempt {attempt}/{max_attempts}): {reason}")]
    Retryable {
        attempt: u32,
        max_attempts: u32,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("AWS SDK error: {0}")]
    Aws(String),

    #[error("Validation error: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SentinelError>;

/// Trait for determining if an error is retryable
///
/// Used by `RetryPolicy` implementations to decide whether an error should
/// trigger another attempt.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for SentinelError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            SentinelError::Retryable { .. }
                | SentinelError::CloudProvider { .. }
                | SentinelError::Io(_)
        )
    }
}
