//! Cache module for Redis-backed state
//!
//! Connection handling with retry lives in [`RedisClient`]; the OTP record
//! store builds its atomic per-key operations on top of it with Lua scripts.

pub mod otp_store;
pub mod redis_client;

#[cfg(test)]
mod tests;

pub use otp_store::RedisOtpStore;
pub use redis_client::RedisClient;

// Re-export commonly used types
pub use bh_shared::config::CacheConfig;
