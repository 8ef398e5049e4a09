//! Auth Error Types
//!
//! Failures reported by the auth service or the controller. Integrates with
//! the unified `kernel::error::AppError` system.

use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
///
/// `Clone` so the last error can be reported to several observers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Service could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// Service answered with an error
    #[error("Auth service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// Refresh requested without a refresh token on record
    #[error("No session to refresh")]
    SessionMissing,

    /// Refresh token rejected by the service
    #[error("Refresh token was rejected")]
    RefreshRejected,

    /// Controller has been stopped
    #[error("Session controller is stopped")]
    Stopped,
}

impl AuthError {
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            message: message.into(),
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Network(_) | AuthError::Service { .. } => ErrorKind::TransientAuth,
            AuthError::SessionMissing | AuthError::RefreshRejected => ErrorKind::Unauthorized,
            AuthError::Stopped => ErrorKind::Internal,
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self, operation: &'static str) {
        match self {
            AuthError::Network(_) | AuthError::Service { .. } => {
                tracing::error!(operation, error = %self, "Auth service call failed");
            }
            AuthError::SessionMissing | AuthError::RefreshRejected => {
                tracing::warn!(operation, error = %self, "Session could not be renewed");
            }
            AuthError::Stopped => {
                tracing::debug!(operation, "Call on stopped session controller");
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let kind = err.kind();
        match &err {
            AuthError::SessionMissing | AuthError::RefreshRejected => {
                AppError::new(kind, "Your session has ended").with_action("Please sign in again")
            }
            _ => AppError::new(kind, "Authentication service is unavailable")
                .with_action("Please try again")
                .with_source(err),
        }
    }
}
