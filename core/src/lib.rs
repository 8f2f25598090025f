//! # BoardHub Core
//!
//! Core business logic and domain layer for the BoardHub backend.
//! This crate contains domain entities, the OTP manager and the account
//! flows built on it, repository interfaces, and error types.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{OtpKey, OtpPurpose, OtpRecord, User, UserRole};
pub use errors::{AuthError, DomainError, DomainResult, OtpError, ValidationError};
pub use repositories::{
    AttemptOutcome, InMemoryOtpStore, InMemoryUserRepository, OtpRecordStore, UserRepository,
};
pub use services::{
    AccountService, DeliveryChannel, DeliveryContext, DeliveryError, OtpCleanupService,
    OtpManager, OtpManagerConfig, PasswordService, Recipient, TokenService,
};
