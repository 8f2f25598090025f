//! Console email delivery for local development
//!
//! Renders the same message the SMTP backend would send and prints it to
//! stdout. Structured logs only carry the masked recipient and message id.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use bh_core::services::otp::{DeliveryChannel, DeliveryContext, DeliveryError};
use bh_shared::utils::email::{is_valid_email, mask_email};

use super::templates::render_otp_email;

/// Delivery channel that prints messages instead of sending them
#[derive(Clone)]
pub struct LogEmailService {
    brand: String,
    message_count: Arc<AtomicU64>,
    simulate_failure: Arc<AtomicBool>,
    console_output: bool,
}

impl LogEmailService {
    pub fn new(brand: impl Into<String>) -> Self {
        Self::with_options(brand, true, false)
    }

    pub fn with_options(brand: impl Into<String>, console_output: bool, simulate_failure: bool) -> Self {
        Self {
            brand: brand.into(),
            message_count: Arc::new(AtomicU64::new(0)),
            simulate_failure: Arc::new(AtomicBool::new(simulate_failure)),
            console_output,
        }
    }

    /// Number of messages "sent" so far
    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    pub fn set_simulate_failure(&self, simulate: bool) {
        self.simulate_failure.store(simulate, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeliveryChannel for LogEmailService {
    async fn send(
        &self,
        identity: &str,
        code: &str,
        context: &DeliveryContext,
    ) -> Result<String, DeliveryError> {
        let masked = mask_email(identity);

        if !is_valid_email(identity) {
            return Err(DeliveryError::Rejected(format!("invalid recipient {}", masked)));
        }

        if self.simulate_failure.load(Ordering::SeqCst) {
            warn!(recipient = %masked, "Log email service simulating failure");
            return Err(DeliveryError::Transport("simulated delivery failure".to_string()));
        }

        let message_id = format!("log_{}", Uuid::new_v4());
        let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;
        let email = render_otp_email(&self.brand, code, context);

        if self.console_output {
            println!("\n{}", "=".repeat(60));
            println!("LOG EMAIL DELIVERY - MESSAGE #{}", count);
            println!("{}", "=".repeat(60));
            println!("To: {}", identity);
            println!("Subject: {}", email.subject);
            println!("Message ID: {}", message_id);
            println!("\n{}", email.text_body);
            println!("{}\n", "=".repeat(60));
        }

        info!(
            target: "email_delivery",
            provider = "log",
            recipient = %masked,
            purpose = %context.purpose,
            message_id = %message_id,
            "Verification email written to console"
        );

        Ok(message_id)
    }
}
