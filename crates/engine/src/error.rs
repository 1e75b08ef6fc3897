//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`Invalid`] thrown when user input breaks a field constraint.
//! - [`KeyNotFound`] thrown when an item is not found.
//! - [`Authentication`] thrown when credentials do not match an account.
//!
//!  [`Invalid`]: EngineError::Invalid
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Authentication`]: EngineError::Authentication
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Why a credential check failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthFailure {
    /// No account is registered under the given email.
    NotFound,
    /// The account exists but the password does not match.
    BadCredentials,
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => f.write_str("unknown email"),
            Self::BadCredentials => f.write_str("bad credentials"),
        }
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Invalid(ValidationErrors),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Authentication failed: {0}")]
    Authentication(AuthFailure),
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Invalid(a), Self::Invalid(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Authentication(a), Self::Authentication(b)) => a == b,
            (Self::PasswordHash(a), Self::PasswordHash(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

/// Translate a failed `users` write into a validation failure when the
/// database rejected it for a duplicate email or username.
///
/// The unique indexes are authoritative for concurrent sign-ups.
pub(crate) fn user_write_error(err: DbErr) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => {
            let mut errors = ValidationErrors::default();
            if message.contains("username") {
                errors.add("username", "has already been taken");
            } else {
                errors.add("email", "has already been taken");
            }
            EngineError::Invalid(errors)
        }
        _ => EngineError::Database(err),
    }
}
