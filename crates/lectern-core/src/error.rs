//! Error types for lectern.

use thiserror::Error;

/// Result type alias using lectern's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lectern operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Job not found
    #[error("Job not found: {0}")]
    JobNotFound(uuid::Uuid),

    /// Text generation failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// Generation backend refused the content on safety grounds
    #[error("Content rejected: {0}")]
    ContentRejected(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation conflicts with the job's current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Authentication/authorization failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is a transient infrastructure failure that is
    /// safe to retry immediately (pool timeout, dropped connection).
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::PoolTimedOut) => true,
            Error::Database(sqlx::Error::Io(_)) => true,
            Error::Database(sqlx::Error::WorkerCrashed) => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_job_not_found() {
        let id = Uuid::nil();
        let err = Error::JobNotFound(id);
        assert_eq!(err.to_string(), format!("Job not found: {}", id));
    }

    #[test]
    fn test_error_display_generation() {
        let err = Error::Generation("model timeout".to_string());
        assert_eq!(err.to_string(), "Generation error: model timeout");
    }

    #[test]
    fn test_error_display_content_rejected() {
        let err = Error::ContentRejected("policy violation".to_string());
        assert_eq!(err.to_string(), "Content rejected: policy violation");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("empty transcript".to_string());
        assert_eq!(err.to_string(), "Invalid input: empty transcript");
    }

    #[test]
    fn test_error_display_conflict() {
        let err = Error::Conflict("job is processing".to_string());
        assert_eq!(err.to_string(), "Conflict: job is processing");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing API key".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing API key");
    }

    #[test]
    fn test_error_display_unauthorized() {
        let err = Error::Unauthorized("invalid user header".to_string());
        assert_eq!(err.to_string(), "Unauthorized: invalid user header");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_is_transient_pool_timeout() {
        let err = Error::Database(sqlx::Error::PoolTimedOut);
        assert!(err.is_transient());
    }

    #[test]
    fn test_is_transient_io() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = Error::Database(sqlx::Error::Io(io));
        assert!(err.is_transient());
    }

    #[test]
    fn test_is_not_transient_row_not_found() {
        let err = Error::Database(sqlx::Error::RowNotFound);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_is_not_transient_other_variants() {
        assert!(!Error::NotFound("x".into()).is_transient());
        assert!(!Error::Generation("x".into()).is_transient());
        assert!(!Error::ContentRejected("x".into()).is_transient());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
