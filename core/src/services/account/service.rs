//! Account service: the callers that consume verified OTPs

use bh_shared::utils::email::{is_valid_email, mask_email, normalize_email};
use serde::Serialize;
use std::sync::Arc;

use crate::domain::entities::otp_record::{OtpPurpose, OtpRecord};
use crate::domain::entities::token::SessionToken;
use crate::domain::entities::user::{User, UserRole};
use crate::errors::{AuthError, DomainResult, ValidationError};
use crate::repositories::otp::OtpRecordStore;
use crate::repositories::user::UserRepository;
use crate::services::otp::{
    DeliveryChannel, OtpManager, Recipient, SendCodeResult, VerifyCodeResult,
};
use crate::services::password::PasswordService;
use crate::services::token::TokenService;

const MAX_FULL_NAME_LENGTH: usize = 100;

/// Outcome of a completed registration
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationResult {
    pub user: User,
    pub session: SessionToken,
}

/// Registration and password reset over email OTPs
///
/// Each `complete_*` call checks the verified gate first and deletes the OTP
/// record only after its own write has succeeded, so a failed account write
/// leaves the verification usable for a retry.
pub struct AccountService<S, D, U>
where
    S: OtpRecordStore + ?Sized,
    D: DeliveryChannel + ?Sized,
    U: UserRepository + ?Sized,
{
    users: Arc<U>,
    otp: Arc<OtpManager<S, D, U>>,
    tokens: Arc<TokenService>,
    passwords: PasswordService,
}

impl<S, D, U> AccountService<S, D, U>
where
    S: OtpRecordStore + ?Sized + 'static,
    D: DeliveryChannel + ?Sized,
    U: UserRepository + ?Sized,
{
    pub fn new(
        users: Arc<U>,
        otp: Arc<OtpManager<S, D, U>>,
        tokens: Arc<TokenService>,
        passwords: PasswordService,
    ) -> Self {
        Self {
            users,
            otp,
            tokens,
            passwords,
        }
    }

    pub fn otp(&self) -> &OtpManager<S, D, U> {
        &self.otp
    }

    /// Send a registration code to `email` unless an account with `role` exists
    pub async fn start_registration(
        &self,
        email: &str,
        role: UserRole,
        full_name: Option<&str>,
    ) -> DomainResult<SendCodeResult> {
        let email = validated_email(email)?;
        let mut recipient = Recipient::new(role);
        if let Some(name) = full_name {
            recipient = recipient.with_display_name(name.trim());
        }
        self.otp
            .request_code(&email, OtpPurpose::Register, &recipient)
            .await
    }

    pub async fn verify_registration(
        &self,
        email: &str,
        code: &str,
    ) -> DomainResult<VerifyCodeResult> {
        self.otp.verify_code(email, OtpPurpose::Register, code).await
    }

    /// Create the account behind a verified registration code and sign it in
    pub async fn complete_registration(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: UserRole,
    ) -> DomainResult<RegistrationResult> {
        let email = validated_email(email)?;
        let full_name = validated_full_name(full_name)?;

        let record = self.otp.consume_verified(&email, OtpPurpose::Register).await?;

        let password_hash = self.passwords.hash(password).await?;
        let user = User::new(email, password_hash, full_name, role);
        let session = self.tokens.issue_session(&user)?;
        let user = self.users.create(user).await?;

        self.finish(&record).await;

        tracing::info!(
            user_id = %user.id,
            identity = %mask_email(&user.email),
            role = %user.role,
            event = "registration_completed",
            "Account registered"
        );

        Ok(RegistrationResult { user, session })
    }

    /// Send a password reset code to an existing `(email, role)` account
    pub async fn start_password_reset(
        &self,
        email: &str,
        role: UserRole,
    ) -> DomainResult<SendCodeResult> {
        let email = validated_email(email)?;
        self.otp
            .request_code(&email, OtpPurpose::ResetPassword, &Recipient::new(role))
            .await
    }

    pub async fn verify_password_reset(
        &self,
        email: &str,
        code: &str,
    ) -> DomainResult<VerifyCodeResult> {
        self.otp
            .verify_code(email, OtpPurpose::ResetPassword, code)
            .await
    }

    /// Replace the password behind a verified reset code
    pub async fn complete_password_reset(
        &self,
        email: &str,
        role: UserRole,
        new_password: &str,
    ) -> DomainResult<()> {
        let email = validated_email(email)?;

        let record = self
            .otp
            .consume_verified(&email, OtpPurpose::ResetPassword)
            .await?;

        let password_hash = self.passwords.hash(new_password).await?;
        let user = self
            .users
            .find_by_email(&email, role)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self.users.update_password(user.id, &password_hash).await? {
            return Err(AuthError::UserNotFound.into());
        }

        self.finish(&record).await;

        tracing::info!(
            user_id = %user.id,
            identity = %mask_email(&email),
            event = "password_reset_completed",
            "Password reset"
        );

        Ok(())
    }

    /// The account write already happened; a leftover record only lingers
    /// until it expires, so a failed delete is logged, not returned.
    async fn finish(&self, record: &OtpRecord) {
        if let Err(e) = self.otp.discard(record).await {
            tracing::error!(
                identity = %mask_email(&record.identity),
                purpose = %record.purpose,
                error = %e,
                event = "otp_discard_failed",
                "Failed to delete consumed verification code"
            );
        }
    }
}

fn validated_email(email: &str) -> Result<String, ValidationError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "email".to_string(),
        });
    }
    if !is_valid_email(&email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email)
}

fn validated_full_name(full_name: &str) -> Result<String, ValidationError> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "full_name".to_string(),
        });
    }
    if full_name.chars().count() > MAX_FULL_NAME_LENGTH {
        return Err(ValidationError::InvalidLength {
            field: "full_name".to_string(),
            min: 1,
            max: MAX_FULL_NAME_LENGTH,
        });
    }
    Ok(full_name.to_string())
}
