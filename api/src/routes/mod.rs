//! HTTP routes

pub mod auth;
pub mod health;

use actix_web::web;

/// Register every route under its scope
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .service(web::scope("/api/v1/auth").configure(auth::configure));
}
