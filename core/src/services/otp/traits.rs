//! Collaborator traits the OTP manager depends on

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::otp_record::OtpPurpose;
use crate::domain::entities::user::UserRole;
use crate::errors::DomainError;
use crate::repositories::user::UserRepository;

/// Who a code is being requested for, as supplied by the calling flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Account kind the identity is checked against
    pub role: UserRole,
    /// Name to greet the recipient with, when known
    pub display_name: Option<String>,
}

impl Recipient {
    pub fn new(role: UserRole) -> Self {
        Self {
            role,
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.display_name = (!name.trim().is_empty()).then_some(name);
        self
    }
}

/// Everything a delivery channel needs to render the message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryContext {
    pub purpose: OtpPurpose,
    pub role: UserRole,
    pub display_name: Option<String>,
    /// Lifetime of the code, for the "expires in N minutes" line
    pub expires_in_minutes: i64,
}

/// Failure reported by a delivery channel
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Recipient rejected: {0}")]
    Rejected(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Could not build message: {0}")]
    Message(String),
}

/// Outbound notification capability (email, SMS...)
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Send `code` to `identity`, returning a provider message id
    async fn send(
        &self,
        identity: &str,
        code: &str,
        context: &DeliveryContext,
    ) -> Result<String, DeliveryError>;
}

/// Answers whether an account exists, without exposing it
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn exists(&self, identity: &str, role: UserRole) -> Result<bool, DomainError>;
}

#[async_trait]
impl<T> IdentityLookup for T
where
    T: UserRepository + ?Sized,
{
    async fn exists(&self, identity: &str, role: UserRole) -> Result<bool, DomainError> {
        self.exists_by_email(identity, role).await
    }
}
