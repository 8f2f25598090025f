//! Shared utilities and common types for BoardHub server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types and loading
//! - Response envelopes
//! - Email normalization and masking helpers

pub mod config;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, CacheConfig, DatabaseConfig, Environment, JwtConfig, LoggingConfig,
    MailConfig, OtpSettings, PasswordConfig, ServerConfig,
};
pub use types::{ApiResponse, ErrorResponse};
pub use utils::email;
