use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use bh_shared::types::ApiResponse;
use bh_shared::utils::email::mask_email;

use crate::dto::auth::{
    CompletePasswordResetRequest, MessageResponse, ResetSendCodeRequest, SendCodeResponse,
    VerifyCodeRequest, VerifyCodeResponse,
};
use crate::handlers::error::{domain_error_response, validation_error_response};
use crate::state::AppState;

/// Handler for POST /api/v1/auth/password-reset/send-code
///
/// Unknown `(email, role)` accounts yield 404.
pub async fn send_code(
    state: web::Data<AppState>,
    request: web::Json<ResetSendCodeRequest>,
) -> HttpResponse {
    if let Err(errors) = request.validate() {
        return validation_error_response(&errors);
    }

    tracing::info!(
        identity = %mask_email(&request.email),
        role = %request.role,
        "Password reset code requested"
    );

    match state
        .accounts
        .start_password_reset(&request.email, request.role)
        .await
    {
        Ok(result) => HttpResponse::Ok().json(ApiResponse::success(SendCodeResponse::from_result(
            &result,
            Utc::now(),
        ))),
        Err(error) => domain_error_response(&error),
    }
}

pub async fn verify_code(
    state: web::Data<AppState>,
    request: web::Json<VerifyCodeRequest>,
) -> HttpResponse {
    if let Err(errors) = request.validate() {
        return validation_error_response(&errors);
    }

    match state
        .accounts
        .verify_password_reset(&request.email, &request.code)
        .await
    {
        Ok(result) => HttpResponse::Ok().json(ApiResponse::success(VerifyCodeResponse::from(result))),
        Err(error) => domain_error_response(&error),
    }
}

/// Handler for POST /api/v1/auth/password-reset/complete
pub async fn complete(
    state: web::Data<AppState>,
    request: web::Json<CompletePasswordResetRequest>,
) -> HttpResponse {
    if let Err(errors) = request.validate() {
        return validation_error_response(&errors);
    }

    match state
        .accounts
        .complete_password_reset(&request.email, request.role, &request.new_password)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::success(MessageResponse::new(
            "Password updated. You can now sign in with your new password.",
        ))),
        Err(error) => domain_error_response(&error),
    }
}
