//! Unified application error types for QuotaHub.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The quota-specific kinds exist so
//! that a calling UI can map each failure to a specific message instead
//! of a generic error banner.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested quota record was not found.
    NotFound,
    /// An allocation or resize carried a non-positive size, or the warning
    /// threshold was outside `[1,100]`.
    InvalidAllocation,
    /// A usage update carried a negative value.
    InvalidUsage,
    /// An active quota record already exists for the entity.
    DuplicateQuota,
    /// An optimistic-concurrency check failed; the caller holds a stale
    /// version and must retry with a fresh read.
    ConcurrentModification,
    /// The store did not respond within the caller-supplied timeout.
    /// The only kind eligible for caller-side retry with backoff.
    StoreUnavailable,
    /// Input validation failed (programming contract violation).
    Validation,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::InvalidAllocation => write!(f, "INVALID_ALLOCATION"),
            Self::InvalidUsage => write!(f, "INVALID_USAGE"),
            Self::DuplicateQuota => write!(f, "DUPLICATE_QUOTA"),
            Self::ConcurrentModification => write!(f, "CONCURRENT_MODIFICATION"),
            Self::StoreUnavailable => write!(f, "STORE_UNAVAILABLE"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

impl ErrorKind {
    /// Whether a caller may retry the failed operation unmodified.
    ///
    /// Only a store timeout is retryable; every other kind indicates a
    /// logic or input error that will fail again identically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable)
    }
}

/// The unified application error used throughout QuotaHub.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an invalid-allocation error.
    pub fn invalid_allocation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidAllocation, message)
    }

    /// Create an invalid-usage error.
    pub fn invalid_usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidUsage, message)
    }

    /// Create a duplicate-quota error.
    pub fn duplicate_quota(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateQuota, message)
    }

    /// Create a concurrent-modification error.
    pub fn concurrent_modification(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConcurrentModification, message)
    }

    /// Create a store-unavailable error.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreUnavailable, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::DuplicateQuota.to_string(), "DUPLICATE_QUOTA");
        assert_eq!(
            ErrorKind::ConcurrentModification.to_string(),
            "CONCURRENT_MODIFICATION"
        );
    }

    #[test]
    fn test_only_store_unavailable_is_retryable() {
        assert!(ErrorKind::StoreUnavailable.is_retryable());
        assert!(!ErrorKind::ConcurrentModification.is_retryable());
        assert!(!ErrorKind::InvalidAllocation.is_retryable());
        assert!(!ErrorKind::NotFound.is_retryable());
    }

    #[test]
    fn test_error_message_format() {
        let err = AppError::invalid_allocation("allocated units must be positive");
        assert_eq!(
            err.to_string(),
            "INVALID_ALLOCATION: allocated units must be positive"
        );
    }
}
