//! Mapping of domain failures onto HTTP responses
//!
//! Every error body is an [`ErrorResponse`]. Failures that can only be fixed
//! by requesting a fresh code carry `next_step = "request_new_code"`.

use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;
use serde_json::json;
use validator::ValidationErrors;

use bh_core::errors::{AuthError, DomainError, OtpError, ValidationError};
use bh_shared::types::ErrorResponse;

const REQUEST_NEW_CODE: &str = "request_new_code";

/// HTTP status for a domain error
pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Otp(otp) => match otp {
            OtpError::Cooldown { .. } => StatusCode::TOO_MANY_REQUESTS,
            OtpError::AlreadyRegistered => StatusCode::CONFLICT,
            OtpError::IdentityNotFound => StatusCode::NOT_FOUND,
            OtpError::DeliveryFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
            OtpError::Incorrect { .. } => StatusCode::BAD_REQUEST,
            OtpError::NotFound | OtpError::AlreadyVerified => StatusCode::BAD_REQUEST,
            OtpError::Expired | OtpError::TooManyAttempts => StatusCode::GONE,
            OtpError::NotVerified => StatusCode::FORBIDDEN,
        },
        DomainError::Auth(auth) => match auth {
            AuthError::WeakPassword { .. } => StatusCode::BAD_REQUEST,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::UserAlreadyExists => StatusCode::CONFLICT,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::PasswordHashingFailed | AuthError::TokenGenerationFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Infrastructure { .. } | DomainError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Convert a domain error into its JSON response
pub fn domain_error_response(error: &DomainError) -> HttpResponse {
    let status = status_for(error);
    if status.is_server_error() {
        tracing::error!(error = %error, status = status.as_u16(), "Request failed");
    } else {
        tracing::debug!(error = %error, status = status.as_u16(), "Request rejected");
    }

    let mut response = HttpResponse::build(status);

    let body = match error {
        DomainError::Otp(otp) => {
            let body = ErrorResponse::new(otp.code(), otp_message(otp));
            match otp {
                OtpError::Cooldown { remaining_seconds } => {
                    response.insert_header((header::RETRY_AFTER, remaining_seconds.to_string()));
                    body.with_detail("retry_after_seconds", json!(remaining_seconds))
                }
                OtpError::Incorrect { remaining_attempts } => {
                    body.with_detail("remaining_attempts", json!(remaining_attempts))
                }
                other if other.requires_new_code() => {
                    body.with_detail("next_step", json!(REQUEST_NEW_CODE))
                }
                _ => body,
            }
        }
        DomainError::Auth(auth) => auth_body(auth),
        DomainError::Validation(validation) => validation_body(validation),
        DomainError::Infrastructure { .. } | DomainError::Internal { .. } => ErrorResponse::new(
            "internal_error",
            "An internal error occurred. Please try again later.",
        ),
    };

    response.json(body)
}

/// Response for a request DTO that failed `validator` checks
pub fn validation_error_response(errors: &ValidationErrors) -> HttpResponse {
    let fields: serde_json::Map<String, serde_json::Value> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages: Vec<String> = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), json!(messages))
        })
        .collect();

    tracing::debug!(fields = ?fields.keys().collect::<Vec<_>>(), "Request validation failed");

    HttpResponse::BadRequest().json(
        ErrorResponse::new("validation_error", "Invalid request data")
            .with_detail("fields", serde_json::Value::Object(fields)),
    )
}

fn otp_message(error: &OtpError) -> String {
    match error {
        OtpError::Cooldown { remaining_seconds } => format!(
            "Please wait {} seconds before requesting another code",
            remaining_seconds
        ),
        OtpError::AlreadyRegistered => "An account with this email already exists".to_string(),
        OtpError::IdentityNotFound => "No account found for this email".to_string(),
        OtpError::DeliveryFailed { .. } => {
            "We could not send the verification email. Please try again later".to_string()
        }
        OtpError::Incorrect { remaining_attempts } => format!(
            "Incorrect code. {} attempt{} remaining",
            remaining_attempts,
            if *remaining_attempts == 1 { "" } else { "s" }
        ),
        // Must not reveal whether a code was ever requested for this email
        OtpError::NotFound
        | OtpError::Expired
        | OtpError::TooManyAttempts
        | OtpError::AlreadyVerified => {
            "This code is no longer valid. Please request a new code".to_string()
        }
        OtpError::NotVerified => "Please verify your email before continuing".to_string(),
    }
}

fn auth_body(error: &AuthError) -> ErrorResponse {
    match error {
        AuthError::WeakPassword { min, max } => ErrorResponse::new(
            "weak_password",
            format!("Password must be between {} and {} characters", min, max),
        ),
        AuthError::UserNotFound => ErrorResponse::new("user_not_found", "User not found"),
        AuthError::UserAlreadyExists => {
            ErrorResponse::new("user_already_exists", "An account with this email already exists")
        }
        AuthError::InvalidToken => ErrorResponse::new("invalid_token", "Invalid session token"),
        AuthError::PasswordHashingFailed | AuthError::TokenGenerationFailed => {
            ErrorResponse::new("internal_error", "An internal error occurred. Please try again later.")
        }
    }
}

fn validation_body(error: &ValidationError) -> ErrorResponse {
    let body = ErrorResponse::new("validation_error", error.to_string());
    match error {
        ValidationError::RequiredField { field } | ValidationError::InvalidLength { field, .. } => {
            body.with_detail("field", json!(field))
        }
        ValidationError::InvalidEmail => body.with_detail("field", json!("email")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn test_cooldown_sets_retry_after() {
        let error = DomainError::from(OtpError::Cooldown { remaining_seconds: 110 });
        let response = domain_error_response(&error);

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "110");

        let body = body_json(response).await;
        assert_eq!(body["error"], "otp_cooldown");
        assert_eq!(body["details"]["retry_after_seconds"], 110);
    }

    #[actix_web::test]
    async fn test_incorrect_reports_remaining_attempts() {
        let error = DomainError::from(OtpError::Incorrect { remaining_attempts: 3 });
        let response = domain_error_response(&error);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["details"]["remaining_attempts"], 3);
    }

    #[actix_web::test]
    async fn test_dead_ends_share_one_message() {
        let mut messages = Vec::new();
        for error in [
            OtpError::NotFound,
            OtpError::Expired,
            OtpError::TooManyAttempts,
            OtpError::AlreadyVerified,
        ] {
            let body = body_json(domain_error_response(&error.into())).await;
            assert_eq!(body["details"]["next_step"], REQUEST_NEW_CODE);
            messages.push(body["message"].as_str().unwrap().to_string());
        }
        messages.dedup();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&OtpError::AlreadyRegistered.into()), StatusCode::CONFLICT);
        assert_eq!(status_for(&OtpError::IdentityNotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&OtpError::DeliveryFailed { reason: "smtp".into() }.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_for(&OtpError::NotVerified.into()), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&OtpError::Expired.into()), StatusCode::GONE);
        assert_eq!(
            status_for(&AuthError::WeakPassword { min: 8, max: 72 }.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn test_infrastructure_error_is_generic() {
        let error = DomainError::infrastructure("redis connection refused at 10.0.0.5");
        let response = domain_error_response(&error);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "internal_error");
        assert!(!body["message"].as_str().unwrap().contains("redis"));
    }
}
