//! Error types for curricula.

use thiserror::Error;

/// Result type alias using curricula's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for curricula operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A required field is missing or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// A foreign-key field does not resolve to an existing entity
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Authentication failed (missing/invalid/expired token, unknown user)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (role or ownership mismatch)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Background job queue error
    #[error("Job error: {0}")]
    Job(String),

    /// File storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("program 7".to_string());
        assert_eq!(err.to_string(), "Not found: program 7");
    }

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("name is required".to_string());
        assert_eq!(err.to_string(), "Validation error: name is required");
    }

    #[test]
    fn test_error_display_invalid_reference() {
        let err = Error::InvalidReference("objective 99 does not exist".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid reference: objective 99 does not exist"
        );
    }

    #[test]
    fn test_error_display_unauthorized() {
        let err = Error::Unauthorized("token expired".to_string());
        assert_eq!(err.to_string(), "Unauthorized: token expired");
    }

    #[test]
    fn test_error_display_forbidden() {
        let err = Error::Forbidden("admin access required".to_string());
        assert_eq!(err.to_string(), "Forbidden: admin access required");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
