//! Domain-specific error types for OTP, account and validation operations
//!
//! Messages here are for logs. The HTTP layer maps each variant to its own
//! user-facing text and status code.

use thiserror::Error;

/// OTP issuance and verification failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    /// A code was issued too recently for this identity and purpose
    #[error("Code requested too soon; retry in {remaining_seconds} seconds")]
    Cooldown { remaining_seconds: u64 },

    /// Registration requested for an identity that already has an account
    #[error("Account already registered")]
    AlreadyRegistered,

    /// Password reset requested for an identity without an account
    #[error("Account not found")]
    IdentityNotFound,

    /// The delivery channel rejected or failed to send the code
    #[error("Code delivery failed: {reason}")]
    DeliveryFailed { reason: String },

    /// No live code for this identity and purpose (never requested, consumed or discarded)
    #[error("No active code")]
    NotFound,

    /// The code is past its lifetime
    #[error("Code expired")]
    Expired,

    /// The attempt budget for this issuance is used up
    #[error("Too many attempts")]
    TooManyAttempts,

    /// The submitted code did not match
    #[error("Incorrect code; {remaining_attempts} attempts remaining")]
    Incorrect { remaining_attempts: u32 },

    /// The code was already verified
    #[error("Code already verified")]
    AlreadyVerified,

    /// Finalization attempted without a live verified code
    #[error("Code not verified")]
    NotVerified,
}

impl OtpError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            OtpError::Cooldown { .. } => "otp_cooldown",
            OtpError::AlreadyRegistered => "already_registered",
            OtpError::IdentityNotFound => "account_not_found",
            OtpError::DeliveryFailed { .. } => "delivery_failed",
            OtpError::NotFound => "otp_not_found",
            OtpError::Expired => "otp_expired",
            OtpError::TooManyAttempts => "otp_too_many_attempts",
            OtpError::Incorrect { .. } => "otp_incorrect",
            OtpError::AlreadyVerified => "otp_already_verified",
            OtpError::NotVerified => "otp_not_verified",
        }
    }

    /// Whether repeating the same request can succeed later without a new code
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OtpError::Cooldown { .. } | OtpError::DeliveryFailed { .. } | OtpError::Incorrect { .. }
        )
    }

    /// Whether the caller has to start over with a fresh code request
    pub fn requires_new_code(&self) -> bool {
        matches!(
            self,
            OtpError::NotFound
                | OtpError::Expired
                | OtpError::TooManyAttempts
                | OtpError::AlreadyVerified
                | OtpError::NotVerified
        )
    }
}

/// Account-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Password must be between {min} and {max} characters")]
    WeakPassword { min: usize, max: usize },

    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Password hashing failed")]
    PasswordHashingFailed,

    #[error("Token generation failed")]
    TokenGenerationFailed,

    #[error("Invalid session token")]
    InvalidToken,
}

/// Input validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field: {field}")]
    RequiredField { field: String },

    #[error("Invalid email")]
    InvalidEmail,

    #[error("Invalid length: {field} (min: {min}, max: {max})")]
    InvalidLength { field: String, min: usize, max: usize },
}
