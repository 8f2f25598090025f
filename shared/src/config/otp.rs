//! One-time passcode policy configuration

use serde::{Deserialize, Serialize};

/// Where OTP records are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map; single instance development only
    Memory,
    Redis,
    Mysql,
}

/// How codes reach the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryBackend {
    Smtp,
    /// Writes the message to the log instead of sending it
    Log,
}

/// OTP issuance and verification policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpSettings {
    /// Number of digits in a code
    pub code_length: usize,

    /// Failed comparisons allowed per issuance
    pub max_attempts: u32,

    /// Minimum seconds between issuances for the same identity and purpose
    pub cooldown_seconds: i64,

    /// Lifetime of a registration code in minutes
    pub register_expiry_minutes: i64,

    /// Lifetime of a password reset code in minutes
    pub reset_expiry_minutes: i64,

    /// Record store backend
    pub store: StoreBackend,

    /// Delivery backend
    pub delivery: DeliveryBackend,

    /// Seconds between expired-record sweeps (0 disables the sweeper)
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            code_length: 6,
            max_attempts: 5,
            cooldown_seconds: 120,
            register_expiry_minutes: 5,
            reset_expiry_minutes: 10,
            store: StoreBackend::Memory,
            delivery: DeliveryBackend::Log,
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

impl OtpSettings {
    /// Check the policy values are usable
    pub fn validate(&self) -> Result<(), String> {
        if !(4..=9).contains(&self.code_length) {
            return Err(format!(
                "otp.code_length must be between 4 and 9, got {}",
                self.code_length
            ));
        }
        if self.max_attempts == 0 {
            return Err("otp.max_attempts must be at least 1".to_string());
        }
        if self.cooldown_seconds < 0 {
            return Err("otp.cooldown_seconds must not be negative".to_string());
        }
        if self.register_expiry_minutes <= 0 || self.reset_expiry_minutes <= 0 {
            return Err("otp expiry must be positive".to_string());
        }
        Ok(())
    }
}

fn default_cleanup_interval() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_policy() {
        let settings = OtpSettings::default();
        assert_eq!(settings.code_length, 6);
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.register_expiry_minutes, 5);
        assert_eq!(settings.reset_expiry_minutes, 10);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let settings = OtpSettings {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_backend_names() {
        let store: StoreBackend = serde_json::from_str("\"redis\"").unwrap();
        assert_eq!(store, StoreBackend::Redis);
        let delivery: DeliveryBackend = serde_json::from_str("\"log\"").unwrap();
        assert_eq!(delivery, DeliveryBackend::Log);
    }
}
