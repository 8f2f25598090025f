//! Configuration for the OTP manager

use bh_shared::config::OtpSettings;
use chrono::Duration;

use crate::domain::entities::otp_record::{
    OtpPurpose, CODE_LENGTH, MAX_ATTEMPTS, REGISTER_EXPIRY_MINUTES, RESEND_COOLDOWN_SECONDS,
    RESET_PASSWORD_EXPIRY_MINUTES,
};

/// Policy the OTP manager enforces
#[derive(Debug, Clone)]
pub struct OtpManagerConfig {
    /// Number of digits in an issued code
    pub code_length: usize,
    /// Failed comparisons allowed per issuance
    pub max_attempts: u32,
    /// Minimum time between issuances for the same key
    pub cooldown: Duration,
    /// Lifetime of a registration code
    pub register_expiry: Duration,
    /// Lifetime of a password reset code
    pub reset_expiry: Duration,
}

impl Default for OtpManagerConfig {
    fn default() -> Self {
        Self {
            code_length: CODE_LENGTH,
            max_attempts: MAX_ATTEMPTS,
            cooldown: Duration::seconds(RESEND_COOLDOWN_SECONDS),
            register_expiry: Duration::minutes(REGISTER_EXPIRY_MINUTES),
            reset_expiry: Duration::minutes(RESET_PASSWORD_EXPIRY_MINUTES),
        }
    }
}

impl OtpManagerConfig {
    /// Lifetime of a code issued for `purpose`
    pub fn expiry_for(&self, purpose: OtpPurpose) -> Duration {
        match purpose {
            OtpPurpose::Register => self.register_expiry,
            OtpPurpose::ResetPassword => self.reset_expiry,
        }
    }
}

impl From<&OtpSettings> for OtpManagerConfig {
    fn from(settings: &OtpSettings) -> Self {
        Self {
            code_length: settings.code_length,
            max_attempts: settings.max_attempts,
            cooldown: Duration::seconds(settings.cooldown_seconds),
            register_expiry: Duration::minutes(settings.register_expiry_minutes),
            reset_expiry: Duration::minutes(settings.reset_expiry_minutes),
        }
    }
}
