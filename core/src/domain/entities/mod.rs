//! Domain entities representing core business objects.

pub mod otp_record;
pub mod token;
pub mod user;

// Re-export commonly used types
pub use otp_record::{
    OtpKey, OtpPurpose, OtpRecord, CODE_LENGTH, MAX_ATTEMPTS, REGISTER_EXPIRY_MINUTES,
    RESEND_COOLDOWN_SECONDS, RESET_PASSWORD_EXPIRY_MINUTES,
};
pub use token::{SessionClaims, SessionToken};
pub use user::{User, UserRole};
