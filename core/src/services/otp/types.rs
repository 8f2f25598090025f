//! Result types for OTP operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::otp_record::OtpPurpose;

/// Result of a successful code request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendCodeResult {
    pub purpose: OtpPurpose,
    /// Provider message id returned by the delivery channel
    pub message_id: String,
    /// When the issued code stops being accepted
    pub expires_at: DateTime<Utc>,
    /// Earliest instant another code may be requested
    pub next_resend_at: DateTime<Utc>,
}

/// Result of a successful verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCodeResult {
    pub purpose: OtpPurpose,
    pub verified_at: DateTime<Utc>,
    /// The verified record must be consumed before this instant
    pub expires_at: DateTime<Utc>,
}
