//! # Infrastructure Layer
//!
//! Concrete collaborators for the BoardHub core:
//! - **Cache**: Redis client and the Redis-backed OTP record store
//! - **Database**: MySQL pool, OTP record store and user repository
//! - **Email**: SMTP delivery of verification codes and a log-only channel
//! - **Health**: reachability checks for the backends above
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-cache`: Enable Redis support (default)

use bh_core::errors::DomainError;

/// Cache module - Redis client and OTP records
pub mod cache;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Email module - verification code delivery
pub mod email;

/// Backend health checks
pub mod health;

pub use health::{run_check, HealthCheck};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// SMTP transport error
    #[error("Mail transport error: {0}")]
    Mail(#[from] lettre::transport::smtp::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stored data could not be mapped back to a domain value
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        DomainError::infrastructure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infrastructure_error_is_not_a_domain_failure() {
        let err: DomainError = InfrastructureError::Config("missing url".to_string()).into();
        assert!(matches!(err, DomainError::Infrastructure { .. }));
        assert!(err.to_string().contains("missing url"));
    }
}
