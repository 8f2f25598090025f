//! Email delivery of verification codes
//!
//! - **SMTP**: production delivery through `lettre`
//! - **Log**: prints messages to the console for local development
//! - **Templates**: purpose-specific subject and body rendering

pub mod log_email;
pub mod smtp;
pub mod templates;

use std::sync::Arc;

use bh_core::services::otp::DeliveryChannel;
use bh_shared::config::{DeliveryBackend, MailConfig};

use crate::health::HealthCheck;
use crate::InfrastructureError;

pub use log_email::LogEmailService;
pub use smtp::SmtpEmailService;
pub use templates::{render_otp_email, RenderedEmail};

/// Delivery channel selected by configuration, with the health check of
/// the relay behind it when there is one
pub struct Delivery {
    pub channel: Arc<dyn DeliveryChannel>,
    pub health_check: Option<Arc<dyn HealthCheck>>,
}

/// Build the delivery channel selected by configuration
pub fn create_delivery_channel(
    backend: DeliveryBackend,
    config: &MailConfig,
) -> Result<Delivery, InfrastructureError> {
    match backend {
        DeliveryBackend::Smtp => {
            let smtp = Arc::new(SmtpEmailService::new(config)?);
            Ok(Delivery {
                channel: smtp.clone(),
                health_check: Some(smtp),
            })
        }
        DeliveryBackend::Log => {
            tracing::warn!("Using log-only email delivery; codes are printed, not sent");
            Ok(Delivery {
                channel: Arc::new(LogEmailService::new(&config.from_name)),
                health_check: None,
            })
        }
    }
}
