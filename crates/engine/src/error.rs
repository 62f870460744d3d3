//! The module contains the errors the engine can return.
//!
//! The errors are:
//!
//! - [`Forbidden`] the actor lacks the role the operation requires.
//! - [`Validation`] malformed input (names, form combinations, date ranges).
//! - [`Conflict`] the store state refuses the change (duplicate member,
//!   referenced category, book creator).
//! - [`KeyNotFound`] a referenced book/category/user/entry does not exist.
//! - [`TransactionFailed`] a multi-step update failed and was rolled back.
//!
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`Validation`]: EngineError::Validation
//!  [`Conflict`]: EngineError::Conflict
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`TransactionFailed`]: EngineError::TransactionFailed
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Permission denied: {0}")]
    Forbidden(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Operation failed: {0}")]
    TransactionFailed(String),
    #[error("Report rendering failed: {0}")]
    Report(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::TransactionFailed(a), Self::TransactionFailed(b)) => a == b,
            (Self::Report(a), Self::Report(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
