//! Security Error Types
//!
//! Security-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Security-specific result type alias
pub type SecurityResult<T> = Result<T, SecurityError>;

/// Security-specific error variants
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Client-side rate limit reached for a category
    #[error("Rate limit exceeded for {category}")]
    RateLimited { category: String, reset_at_ms: i64 },

    /// Field value longer than its configured limit
    #[error("Field {field} exceeds {max} characters")]
    FieldTooLong { field: String, max: usize },

    /// Upload category not present in the policy
    #[error("Unknown file category: {0}")]
    UnknownFileCategory(String),

    /// MIME type not allowed for the category
    #[error("File type {mime} is not allowed for {category}")]
    FileTypeNotAllowed { category: String, mime: String },

    /// Upload larger than the category allows
    #[error("File is too large: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: u64 },

    /// Validation pattern name not present in the policy
    #[error("Unknown validation pattern: {0}")]
    UnknownPattern(String),

    /// Environment name not recognised
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),
}

impl SecurityError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SecurityError::RateLimited { .. } => ErrorKind::RateLimited,
            SecurityError::FieldTooLong { .. }
            | SecurityError::FileTypeNotAllowed { .. }
            | SecurityError::FileTooLarge { .. } => ErrorKind::InvalidInput,
            SecurityError::UnknownFileCategory(_)
            | SecurityError::UnknownPattern(_)
            | SecurityError::UnknownEnvironment(_) => ErrorKind::ConfigurationGap,
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            SecurityError::RateLimited { category, .. } => {
                tracing::warn!(category = %category, "Client rate limit reached");
            }
            SecurityError::UnknownFileCategory(_)
            | SecurityError::UnknownPattern(_)
            | SecurityError::UnknownEnvironment(_) => {
                tracing::warn!(error = %self, "Security configuration gap");
            }
            _ => {
                tracing::debug!(error = %self, "Security check failed");
            }
        }
    }
}

impl From<SecurityError> for AppError {
    fn from(err: SecurityError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        match &err {
            SecurityError::RateLimited { .. } => AppError::new(kind, message)
                .with_action("Please wait a moment before trying again"),
            SecurityError::FileTypeNotAllowed { .. } | SecurityError::FileTooLarge { .. } => {
                AppError::new(kind, message).with_action("Choose a different file")
            }
            _ => AppError::new(kind, message),
        }
    }
}
