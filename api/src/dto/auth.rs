use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use bh_core::domain::entities::{SessionToken, User, UserRole};
use bh_core::services::{SendCodeResult, VerifyCodeResult};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterSendCodeRequest {
    #[validate(email, length(max = 254))]
    pub email: String,

    pub role: UserRole,

    /// Used to greet the recipient in the email
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetSendCodeRequest {
    #[validate(email, length(max = 254))]
    pub email: String,

    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    #[validate(email, length(max = 254))]
    pub email: String,

    /// Numeric code from the email; surrounding whitespace is ignored
    #[validate(length(min = 1, max = 16))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompleteRegistrationRequest {
    #[validate(email, length(max = 254))]
    pub email: String,

    pub role: UserRole,

    #[validate(length(min = 1, max = 100))]
    pub full_name: String,

    #[validate(length(min = 8, max = 72))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompletePasswordResetRequest {
    #[validate(email, length(max = 254))]
    pub email: String,

    pub role: UserRole,

    #[validate(length(min = 8, max = 72))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendCodeResponse {
    pub message: String,
    pub expires_at: DateTime<Utc>,
    pub resend_after: i64, // seconds until a resend is accepted, rounded up
}

impl SendCodeResponse {
    pub fn from_result(result: &SendCodeResult, now: DateTime<Utc>) -> Self {
        Self {
            message: "Verification code sent. Please check your email.".to_string(),
            expires_at: result.expires_at,
            resend_after: ((result.next_resend_at - now).num_milliseconds().max(0) + 999) / 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCodeResponse {
    pub verified: bool,
    /// Deadline for completing the flow with this verification
    pub expires_at: DateTime<Utc>,
}

impl From<VerifyCodeResult> for VerifyCodeResponse {
    fn from(result: VerifyCodeResult) -> Self {
        Self {
            verified: true,
            expires_at: result.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

impl AuthResponse {
    pub fn new(session: SessionToken, user: User) -> Self {
        Self {
            token: session.token,
            expires_in: session.expires_in,
            user: user.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bh_core::domain::entities::OtpPurpose;
    use chrono::Duration;

    #[test]
    fn test_resend_after_rounds_up() {
        let now = Utc::now();
        let result = SendCodeResult {
            purpose: OtpPurpose::Register,
            message_id: "m-1".to_string(),
            expires_at: now + Duration::minutes(5),
            next_resend_at: now + Duration::milliseconds(119_400),
        };
        assert_eq!(SendCodeResponse::from_result(&result, now).resend_after, 120);

        let late = now + Duration::minutes(3);
        assert_eq!(SendCodeResponse::from_result(&result, late).resend_after, 0);
    }

    #[test]
    fn test_register_request_validation() {
        let request = RegisterSendCodeRequest {
            email: "ana@example.com".to_string(),
            role: UserRole::Tenant,
            full_name: Some("x".repeat(101)),
        };
        assert!(request.validate().is_err());

        let request = RegisterSendCodeRequest {
            full_name: None,
            ..request
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_reset_password_length_matches_bcrypt_input() {
        let request = CompletePasswordResetRequest {
            email: "ana@example.com".to_string(),
            role: UserRole::Owner,
            new_password: "x".repeat(73),
        };
        assert!(request.validate().is_err());

        let request = CompletePasswordResetRequest {
            new_password: "x".repeat(72),
            ..request
        };
        assert!(request.validate().is_ok());
    }
}
