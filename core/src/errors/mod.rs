//! Domain-specific error types and error handling.

mod types;

pub use types::{AuthError, OtpError, ValidationError};

use thiserror::Error;

/// Core domain errors
///
/// Domain failures (`Otp`, `Auth`, `Validation`) are kept apart from
/// `Infrastructure`, so callers never confuse a wrong code with an
/// unreachable store.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error(transparent)]
    Otp(#[from] OtpError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Store, cache or transport fault
    #[error("Infrastructure error: {message}")]
    Infrastructure { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    /// Wrap a persistence or transport fault
    pub fn infrastructure(message: impl Into<String>) -> Self {
        DomainError::Infrastructure {
            message: message.into(),
        }
    }

    /// The OTP failure kind, if this is one
    pub fn as_otp(&self) -> Option<&OtpError> {
        match self {
            DomainError::Otp(e) => Some(e),
            _ => None,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
