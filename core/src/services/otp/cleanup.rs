//! Periodic removal of expired OTP records
//!
//! Redis expires records on its own; relational and in-memory stores rely on
//! this sweeper so abandoned codes do not accumulate.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::DomainError;
use crate::repositories::otp::OtpRecordStore;

use super::clock::{Clock, SystemClock};

/// Configuration for the OTP cleanup service
#[derive(Debug, Clone)]
pub struct OtpCleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_seconds: u64,
    /// Whether to enable automatic cleanup
    pub enabled: bool,
}

impl Default for OtpCleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
            enabled: true,
        }
    }
}

impl OtpCleanupConfig {
    /// An interval of zero disables the sweeper
    pub fn from_interval(interval_seconds: u64) -> Self {
        Self {
            interval_seconds,
            enabled: interval_seconds > 0,
        }
    }
}

/// Service that purges expired OTP records
pub struct OtpCleanupService<S: OtpRecordStore + ?Sized + 'static> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: OtpCleanupConfig,
}

impl<S: OtpRecordStore + ?Sized + 'static> OtpCleanupService<S> {
    pub fn new(store: Arc<S>, config: OtpCleanupConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, config: OtpCleanupConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Run a single cleanup cycle
    pub async fn run_cleanup(&self) -> Result<CleanupResult, DomainError> {
        if !self.config.enabled {
            return Ok(CleanupResult::default());
        }

        let purged = self.store.purge_expired(self.clock.now()).await?;
        if purged > 0 {
            info!(purged = purged, event = "otp_cleanup", "Purged expired verification codes");
        }

        Ok(CleanupResult {
            expired_records_deleted: purged,
        })
    }

    /// Start the cleanup service as a background task
    ///
    /// Returns `None` when the service is disabled.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("OTP cleanup service is disabled");
            return None;
        }

        let interval = std::time::Duration::from_secs(self.config.interval_seconds);

        Some(tokio::spawn(async move {
            info!(
                "OTP cleanup service started - will run every {} seconds",
                self.config.interval_seconds
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                if let Err(e) = self.run_cleanup().await {
                    error!("OTP cleanup cycle failed: {}", e);
                }
            }
        }))
    }
}

/// Result of a cleanup operation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupResult {
    pub expired_records_deleted: u64,
}
