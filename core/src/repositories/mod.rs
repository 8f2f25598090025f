//! Repository interfaces for persistence collaborators.

pub mod otp;
pub mod user;

pub use otp::{AttemptOutcome, InMemoryOtpStore, OtpRecordStore};
pub use user::{InMemoryUserRepository, UserRepository};
