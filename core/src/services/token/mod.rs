//! Session token minting for freshly registered accounts
//!
//! Tokens are HS256 JWTs. Checking them on later requests belongs to the
//! request middleware; `decode` exists for that and for tests.

mod config;
mod service;

pub use config::TokenServiceConfig;
pub use service::TokenService;
