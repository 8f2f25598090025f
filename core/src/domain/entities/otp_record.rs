//! One-time passcode record used for email identity proofing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of digits in an issued code
pub const CODE_LENGTH: usize = 6;

/// Failed comparisons allowed per issuance
pub const MAX_ATTEMPTS: u32 = 5;

/// Minimum seconds between two issuances for the same key
pub const RESEND_COOLDOWN_SECONDS: i64 = 120;

/// Lifetime of a registration code
pub const REGISTER_EXPIRY_MINUTES: i64 = 5;

/// Lifetime of a password reset code
pub const RESET_PASSWORD_EXPIRY_MINUTES: i64 = 10;

/// Flow an OTP is scoped to. Records for different purposes never interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    /// Proving control of an email before an account is created
    Register,
    /// Proving control of an email before its password is replaced
    ResetPassword,
}

impl OtpPurpose {
    /// Stable identifier used in store keys and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Register => "register",
            OtpPurpose::ResetPassword => "reset_password",
        }
    }

    /// Default lifetime of a code issued for this purpose
    pub fn expiry(&self) -> Duration {
        match self {
            OtpPurpose::Register => Duration::minutes(REGISTER_EXPIRY_MINUTES),
            OtpPurpose::ResetPassword => Duration::minutes(RESET_PASSWORD_EXPIRY_MINUTES),
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "register" => Ok(OtpPurpose::Register),
            "reset_password" => Ok(OtpPurpose::ResetPassword),
            other => Err(format!("Unknown OTP purpose: {}", other)),
        }
    }
}

/// Composite key of an OTP record. At most one live record exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OtpKey {
    /// Normalized identity (email address)
    pub identity: String,
    /// Flow the record belongs to
    pub purpose: OtpPurpose,
}

impl OtpKey {
    pub fn new(identity: impl Into<String>, purpose: OtpPurpose) -> Self {
        Self {
            identity: identity.into(),
            purpose,
        }
    }
}

impl fmt::Display for OtpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.purpose, self.identity)
    }
}

/// A single issuance of a one-time passcode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    /// Fresh identifier per issuance; guards conditional writes so a stale
    /// verification never mutates a code that has since been replaced
    pub issuance_id: Uuid,

    /// Normalized identity the code was sent to
    pub identity: String,

    /// Flow the code is scoped to
    pub purpose: OtpPurpose,

    /// Numeric code as sent
    pub code: String,

    /// When the code was issued (first send or latest resend)
    pub issued_at: DateTime<Utc>,

    /// Instant from which the code is no longer accepted
    pub expires_at: DateTime<Utc>,

    /// Failed comparisons since issuance
    pub attempts: u32,

    /// Set on the first successful comparison
    pub verified: bool,
}

impl OtpRecord {
    /// Create a pending record for a freshly generated code
    pub fn issue(
        identity: impl Into<String>,
        purpose: OtpPurpose,
        code: impl Into<String>,
        now: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        Self {
            issuance_id: Uuid::new_v4(),
            identity: identity.into(),
            purpose,
            code: code.into(),
            issued_at: now,
            expires_at: now + lifetime,
            attempts: 0,
            verified: false,
        }
    }

    /// Key this record is stored under
    pub fn key(&self) -> OtpKey {
        OtpKey::new(self.identity.clone(), self.purpose)
    }

    /// Whether the code is past its lifetime at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Comparisons left before the record is discarded
    pub fn remaining_attempts(&self, max_attempts: u32) -> u32 {
        max_attempts.saturating_sub(self.attempts)
    }

    /// Whether the attempt budget is used up
    pub fn attempts_exhausted(&self, max_attempts: u32) -> bool {
        self.attempts >= max_attempts
    }

    /// Seconds (rounded up) until another code may be issued, or `None`
    /// when the cooldown has elapsed
    pub fn cooldown_remaining(&self, now: DateTime<Utc>, cooldown: Duration) -> Option<u64> {
        let elapsed = now - self.issued_at;
        if elapsed >= cooldown {
            return None;
        }

        let remaining = (cooldown - elapsed).min(cooldown);
        let millis = remaining.num_milliseconds().max(1);
        Some(((millis + 999) / 1000) as u64)
    }

    /// Time left until expiry at `now`, zero once expired
    pub fn time_until_expiration(&self, now: DateTime<Utc>) -> Duration {
        if self.expires_at > now {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }
}
