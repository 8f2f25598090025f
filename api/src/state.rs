//! Shared application state

use std::sync::Arc;

use chrono::{DateTime, Utc};

use bh_core::repositories::{OtpRecordStore, UserRepository};
use bh_core::services::{
    AccountService, DeliveryChannel, OtpManager, OtpManagerConfig, PasswordService, TokenService,
    TokenServiceConfig,
};
use bh_infra::HealthCheck;
use bh_shared::config::AppConfig;

/// Account flows over trait-object collaborators, so the backend can be
/// chosen at startup
pub type Accounts = AccountService<dyn OtpRecordStore, dyn DeliveryChannel, dyn UserRepository>;

/// State handed to every request handler
pub struct AppState {
    pub accounts: Arc<Accounts>,
    /// Backends reported by `/health`
    pub health_checks: Vec<Arc<dyn HealthCheck>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(accounts: Arc<Accounts>) -> Self {
        Self {
            accounts,
            health_checks: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn with_health_checks(mut self, checks: Vec<Arc<dyn HealthCheck>>) -> Self {
        self.health_checks = checks;
        self
    }

    /// Assemble the account flows from concrete collaborators and configuration
    pub fn build(
        store: Arc<dyn OtpRecordStore>,
        delivery: Arc<dyn DeliveryChannel>,
        users: Arc<dyn UserRepository>,
        config: &AppConfig,
    ) -> Self {
        let otp = OtpManager::new(
            store,
            delivery,
            users.clone(),
            OtpManagerConfig::from(&config.otp),
        );
        Self::from_manager(Arc::new(otp), users, config)
    }

    /// Same as [`AppState::build`] around an already constructed manager,
    /// e.g. one running on a test clock
    pub fn from_manager(
        otp: Arc<OtpManager<dyn OtpRecordStore, dyn DeliveryChannel, dyn UserRepository>>,
        users: Arc<dyn UserRepository>,
        config: &AppConfig,
    ) -> Self {
        let tokens = TokenService::new(TokenServiceConfig::from(&config.auth.jwt));
        let passwords = PasswordService::new(config.auth.password.clone());
        let accounts = AccountService::new(users, otp, Arc::new(tokens), passwords);
        Self::new(Arc::new(accounts))
    }
}
