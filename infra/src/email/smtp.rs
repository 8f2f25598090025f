//! SMTP delivery through `lettre`

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};
use uuid::Uuid;

use bh_core::services::otp::{DeliveryChannel, DeliveryContext, DeliveryError};
use bh_shared::config::MailConfig;
use bh_shared::utils::email::mask_email;

use super::templates::render_otp_email;
use crate::health::HealthCheck;
use crate::InfrastructureError;

/// Sends verification emails over an SMTP relay
#[derive(Clone)]
pub struct SmtpEmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    brand: String,
}

impl SmtpEmailService {
    /// Build the transport from configuration.
    ///
    /// Port 465 uses implicit TLS, `localhost` relays are plaintext and
    /// everything else negotiates STARTTLS.
    pub fn new(config: &MailConfig) -> Result<Self, InfrastructureError> {
        let from: Mailbox = config
            .mailbox()
            .parse()
            .map_err(|e| InfrastructureError::Config(format!("invalid sender mailbox: {}", e)))?;

        let host = config.smtp_host.as_str();
        let mut builder = if host == "localhost" || host == "127.0.0.1" {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        } else if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        };

        builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        info!(host = %host, port = config.smtp_port, "SMTP transport configured");

        Ok(Self {
            transport: builder.build(),
            from,
            brand: config.from_name.clone(),
        })
    }

    /// Open a connection to the relay and issue NOOP
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        Ok(self.transport.test_connection().await?)
    }

    fn message_id(&self) -> String {
        format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain())
    }
}

#[async_trait]
impl HealthCheck for SmtpEmailService {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn check(&self) -> Result<bool, InfrastructureError> {
        self.health_check().await
    }
}

#[async_trait]
impl DeliveryChannel for SmtpEmailService {
    async fn send(
        &self,
        identity: &str,
        code: &str,
        context: &DeliveryContext,
    ) -> Result<String, DeliveryError> {
        let masked = mask_email(identity);
        let to: Mailbox = identity
            .parse()
            .map_err(|_| DeliveryError::Rejected(format!("invalid recipient {}", masked)))?;

        let email = render_otp_email(&self.brand, code, context);
        let message_id = self.message_id();

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .message_id(Some(message_id.clone()))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body),
                    ),
            )
            .map_err(|e| DeliveryError::Message(e.to_string()))?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!(
                    target: "email_delivery",
                    provider = "smtp",
                    recipient = %masked,
                    purpose = %context.purpose,
                    message_id = %message_id,
                    "Verification email sent"
                );
                Ok(message_id)
            }
            Err(e) if e.is_permanent() => {
                error!(recipient = %masked, error = %e, "SMTP relay rejected message");
                Err(DeliveryError::Rejected(e.to_string()))
            }
            Err(e) => {
                error!(recipient = %masked, error = %e, "SMTP delivery failed");
                Err(DeliveryError::Transport(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, port: u16) -> MailConfig {
        MailConfig {
            smtp_host: host.to_string(),
            smtp_port: port,
            ..MailConfig::default()
        }
    }

    #[tokio::test]
    async fn test_builds_plaintext_transport_for_localhost() {
        let service = SmtpEmailService::new(&config("localhost", 1025)).unwrap();
        assert_eq!(service.from.email.to_string(), "no-reply@boardhub.local");
        assert!(service.message_id().ends_with("@boardhub.local>"));
    }

    #[tokio::test]
    async fn test_builds_tls_transport_for_relay() {
        assert!(SmtpEmailService::new(&config("smtp.example.com", 587)).is_ok());
        assert!(SmtpEmailService::new(&config("smtp.example.com", 465)).is_ok());
    }

    #[tokio::test]
    async fn test_rejects_invalid_sender() {
        let mut mail = config("localhost", 1025);
        mail.from_address = "not an address".to_string();

        assert!(matches!(
            SmtpEmailService::new(&mail),
            Err(InfrastructureError::Config(_))
        ));
    }
}
