//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical business areas:
//! - `auth` - Session token and password policy configuration
//! - `cache` - Redis configuration
//! - `database` - Database connection and pool configuration
//! - `environment` - Environment detection and logging configuration
//! - `mail` - SMTP delivery configuration
//! - `otp` - One-time passcode policy and backend selection
//! - `server` - HTTP server configuration

pub mod auth;
pub mod cache;
pub mod database;
pub mod environment;
pub mod mail;
pub mod otp;
pub mod server;

use config::{Config, ConfigError, Environment as EnvSource, File};
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use auth::{AuthConfig, JwtConfig, PasswordConfig};
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use mail::MailConfig;
pub use otp::{DeliveryBackend, OtpSettings, StoreBackend};
pub use server::ServerConfig;

/// Prefix for environment variable overrides, e.g. `BH__OTP__COOLDOWN_SECONDS=30`
pub const ENV_PREFIX: &str = "BH";

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Redis configuration
    pub cache: CacheConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// OTP policy configuration
    pub otp: OtpSettings,

    /// Mail delivery configuration
    pub mail: MailConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            auth: AuthConfig::default(),
            otp: OtpSettings::default(),
            mail: MailConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional per-environment TOML
    /// file and `BH__*` environment variables (highest precedence).
    ///
    /// A `.env` file in the working directory is read first when present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = Environment::from_env();
        let mut defaults = Self::default();
        defaults.environment = environment;
        defaults.logging = LoggingConfig::for_environment(environment);

        let config = Config::builder()
            .add_source(Config::try_from(&defaults)?)
            .add_source(File::with_name(environment.config_file()).required(false))
            .add_source(
                EnvSource::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject combinations that cannot run safely
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment.is_production() && self.auth.jwt.is_using_default_secret() {
            return Err(ConfigError::Message(
                "auth.jwt.secret must be set in production".to_string(),
            ));
        }
        if self.environment.is_production() && self.otp.store == StoreBackend::Memory {
            return Err(ConfigError::Message(
                "otp.store=memory does not survive restarts; use redis or mysql in production"
                    .to_string(),
            ));
        }
        if self.environment.is_production() && self.otp.delivery == DeliveryBackend::Log {
            return Err(ConfigError::Message(
                "otp.delivery=log prints codes instead of sending them; use smtp in production"
                    .to_string(),
            ));
        }
        self.otp.validate().map_err(ConfigError::Message)
    }
}
