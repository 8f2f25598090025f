//! OTP issuance and verification
//!
//! This module owns the per-`(identity, purpose)` state machine:
//! - Code generation and delivery with a resend cooldown
//! - Expiry and bounded verification attempts
//! - The verified gate consumed by registration and password reset
//! - Background sweeping of expired records

mod cleanup;
mod clock;
mod config;
mod generator;
mod manager;
mod traits;
mod types;

#[cfg(test)]
pub(crate) mod tests;

pub use cleanup::{CleanupResult, OtpCleanupConfig, OtpCleanupService};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::OtpManagerConfig;
pub use generator::generate_code;
pub use manager::OtpManager;
pub use traits::{DeliveryChannel, DeliveryContext, DeliveryError, IdentityLookup, Recipient};
pub use types::{SendCodeResult, VerifyCodeResult};
