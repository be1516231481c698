//! The one error type shared by every registrar crate.
//!
//! Query code reports missing rows, rejected input and storage failures
//! here; the HTTP layer turns each variant into a status and a short code.

use std::fmt;

/// Every failure a registrar operation can report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested or referenced entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "user", "batch").
        entity: String,
        /// Id as given by the caller.
        id: String,
    },

    /// Request data failed validation, including uniqueness violations.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No admin credentials were presented.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credentials were presented but do not match.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// SQLite or the pool failed.
    #[error("Database error: {source}")]
    Database {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Filesystem failure, e.g. creating the database directory.
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Unauthorized(_) => 401,
            Error::Forbidden(_) => 403,
            Error::Database { .. } | Error::Io { .. } | Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::Validation(_) => "validation_error",
            Error::Unauthorized(_) => "unauthorized",
            Error::Forbidden(_) => "forbidden",
            Error::Database { .. } => "database_error",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// `entity` names the table-level kind ("user", "course").
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = Error::not_found("user", 42);
        assert_eq!(err.to_string(), "user not found: 42");
        assert_eq!(err.http_status(), 404);
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn validation_display() {
        let err = Error::validation("grade must be at most 2 characters");
        assert_eq!(err.to_string(), "Validation error: grade must be at most 2 characters");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn unauthorized_and_forbidden() {
        assert_eq!(Error::Unauthorized("no token".into()).http_status(), 401);
        assert_eq!(Error::Forbidden("admin only".into()).http_status(), 403);
    }

    #[test]
    fn database_display() {
        let err = Error::database("disk I/O error");
        assert!(err.to_string().contains("disk I/O error"));
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.code(), "database_error");
    }

    #[test]
    fn io_from_std() {
        let err: Error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only fs").into();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.http_status(), 500);
    }
}
