//! Database module - MySQL implementations using SQLx
//!
//! - Connection pool management and embedded migrations
//! - OTP record store with issuance-guarded conditional statements
//! - User repository

pub mod connection;
pub mod mysql;

// Re-export commonly used types
pub use connection::{DatabasePool, PoolStatistics};
pub use mysql::{MySqlOtpStore, MySqlUserRepository};
