use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use bh_shared::types::ApiResponse;
use bh_shared::utils::email::mask_email;

use crate::dto::auth::{
    AuthResponse, CompleteRegistrationRequest, RegisterSendCodeRequest, SendCodeResponse,
    VerifyCodeRequest, VerifyCodeResponse,
};
use crate::handlers::error::{domain_error_response, validation_error_response};
use crate::state::AppState;

/// Handler for POST /api/v1/auth/register/send-code
///
/// ```json
/// { "email": "ana@example.com", "role": "tenant", "full_name": "Ana Cruz" }
/// ```
///
/// Responds with the code expiry and the number of seconds before a resend
/// is accepted. An existing account for `(email, role)` yields 409, an
/// unexpired cooldown 429 with `Retry-After`.
pub async fn send_code(
    state: web::Data<AppState>,
    request: web::Json<RegisterSendCodeRequest>,
) -> HttpResponse {
    if let Err(errors) = request.validate() {
        return validation_error_response(&errors);
    }

    tracing::info!(
        identity = %mask_email(&request.email),
        role = %request.role,
        "Registration code requested"
    );

    match state
        .accounts
        .start_registration(&request.email, request.role, request.full_name.as_deref())
        .await
    {
        Ok(result) => HttpResponse::Ok().json(ApiResponse::success(SendCodeResponse::from_result(
            &result,
            Utc::now(),
        ))),
        Err(error) => domain_error_response(&error),
    }
}

/// Handler for POST /api/v1/auth/register/verify-code
pub async fn verify_code(
    state: web::Data<AppState>,
    request: web::Json<VerifyCodeRequest>,
) -> HttpResponse {
    if let Err(errors) = request.validate() {
        return validation_error_response(&errors);
    }

    match state
        .accounts
        .verify_registration(&request.email, &request.code)
        .await
    {
        Ok(result) => HttpResponse::Ok().json(ApiResponse::success(VerifyCodeResponse::from(result))),
        Err(error) => domain_error_response(&error),
    }
}

/// Handler for POST /api/v1/auth/register/complete
///
/// Requires a verified registration code for `email`. Creates the account
/// and returns a session token (201).
pub async fn complete(
    state: web::Data<AppState>,
    request: web::Json<CompleteRegistrationRequest>,
) -> HttpResponse {
    if let Err(errors) = request.validate() {
        return validation_error_response(&errors);
    }

    let request = request.into_inner();
    match state
        .accounts
        .complete_registration(&request.email, &request.password, &request.full_name, request.role)
        .await
    {
        Ok(result) => HttpResponse::Created()
            .json(ApiResponse::success(AuthResponse::new(result.session, result.user))),
        Err(error) => domain_error_response(&error),
    }
}
