//! Account route handlers
//!
//! - Registration: send, verify and complete
//! - Password reset: send, verify and complete

pub mod password_reset;
pub mod register;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/register")
            .route("/send-code", web::post().to(register::send_code))
            .route("/verify-code", web::post().to(register::verify_code))
            .route("/complete", web::post().to(register::complete)),
    )
    .service(
        web::scope("/password-reset")
            .route("/send-code", web::post().to(password_reset::send_code))
            .route("/verify-code", web::post().to(password_reset::verify_code))
            .route("/complete", web::post().to(password_reset::complete)),
    );
}
