//! Application factory

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{error, web, App, Error, HttpResponse};
use tracing_actix_web::TracingLogger;

use bh_shared::config::AppConfig;
use bh_shared::types::ErrorResponse;

use crate::middleware::{create_cors, security_headers};
use crate::routes;
use crate::state::AppState;

/// Create the application with all routes and middleware
pub fn create_app(
    state: web::Data<AppState>,
    config: &AppConfig,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .app_data(json_config())
        // Registered last so it wraps every other middleware
        .wrap(security_headers(config.environment))
        .wrap(create_cors(&config.server, config.environment))
        .wrap(TracingLogger::default())
        .configure(routes::configure)
        .default_service(web::route().to(not_found))
}

/// Malformed bodies get the same envelope as domain errors
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| {
            let body = ErrorResponse::new("invalid_request_body", err.to_string());
            error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        })
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        "not_found",
        "The requested resource was not found",
    ))
}
