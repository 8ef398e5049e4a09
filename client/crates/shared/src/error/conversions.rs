//! Error conversions
//!
//! Serialization failures the client surfaces as [`AppError`].

use super::app_error::AppError;

// ============================================================================
// serde_json conversions
// ============================================================================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            AppError::storage_failure("Local storage is unavailable").with_source(err)
        } else {
            AppError::invalid_input(format!("Malformed JSON at line {}", err.line())).with_source(err)
        }
    }
}
