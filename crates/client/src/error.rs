//! Unified error handling.
//!
//! Provides a unified `AppError` type for component-level operations
//! (create/update/delete course, enroll, review submit/delete). Operations
//! log and re-throw remote failures so a front end can display a message;
//! there is no automatic retry anywhere - a failed remote call requires the
//! user to re-trigger the action.

use thiserror::Error;

use crate::session::AuthError;
use crate::supabase::SupabaseError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input detected before any remote call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Remote call to the hosted backend failed.
    #[error("Backend error: {0}")]
    Backend(#[from] SupabaseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation requires an authenticated session.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("course 123".to_string());
        assert_eq!(err.to_string(), "Not found: course 123");

        let err = AppError::Validation("missing user id".to_string());
        assert_eq!(err.to_string(), "Validation error: missing user id");
    }

    #[test]
    fn test_backend_error_converts() {
        let err: AppError = SupabaseError::NotFound("profile".to_string()).into();
        assert!(matches!(err, AppError::Backend(_)));
    }
}
