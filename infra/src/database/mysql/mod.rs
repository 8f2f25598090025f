//! MySQL implementations of the core repository traits

pub mod otp_store_impl;
pub mod user_repository_impl;

pub use otp_store_impl::MySqlOtpStore;
pub use user_repository_impl::MySqlUserRepository;

use bh_core::errors::DomainError;

use crate::InfrastructureError;

/// Lift a query failure into the domain's infrastructure variant
pub(crate) fn db_error(e: sqlx::Error) -> DomainError {
    tracing::error!("Database query failed: {}", e);
    InfrastructureError::Database(e).into()
}

/// Whether the failure is a duplicate key on insert
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
