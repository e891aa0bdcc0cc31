//! Error types for hikehub-social
//!
//! Every failure is classified into an [`ErrorKind`]; the HTTP layer maps
//! kinds to status codes without looking at message text.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SocialError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classification exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    AlreadyExists,
    Forbidden,
    Unauthenticated,
    Internal,
}

impl SocialError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SocialError::NotFound(_) => ErrorKind::NotFound,
            SocialError::InvalidArgument(_) | SocialError::Json(_) => ErrorKind::InvalidArgument,
            SocialError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            SocialError::Forbidden(_) => ErrorKind::Forbidden,
            SocialError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            SocialError::Io(_) | SocialError::Config(_) | SocialError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Wrap a Diesel error with the failed operation's name.
    ///
    /// Unique violations are reported as `AlreadyExists`; the unique indexes
    /// on reviews, upvotes and follows are the last line against concurrent
    /// duplicate inserts. Check violations (rating range, self-follow) are
    /// reported as `InvalidArgument`.
    pub fn db(op: &str, e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                SocialError::AlreadyExists(format!("{}: {}", op, info.message()))
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                SocialError::InvalidArgument(format!("{}: {}", op, info.message()))
            }
            other => SocialError::Internal(format!("{} failed: {}", op, other)),
        }
    }
}

impl From<DieselError> for SocialError {
    fn from(e: DieselError) -> Self {
        SocialError::db("Transaction", e)
    }
}

impl From<diesel::r2d2::PoolError> for SocialError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        SocialError::Internal(format!("Connection pool error: {}", e))
    }
}
