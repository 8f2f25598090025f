//! CORS configuration for browser and mobile clients
//!
//! Development allows any origin. Other environments only allow the origins
//! listed in `server.allowed_origins`.

use actix_cors::Cors;
use actix_web::http::{header, Method};

use bh_shared::config::{Environment, ServerConfig};

const MAX_AGE_SECONDS: usize = 3600;

/// Build the CORS middleware for `environment`
pub fn create_cors(server: &ServerConfig, environment: Environment) -> Cors {
    if environment.is_development() {
        create_development_cors()
    } else {
        create_restricted_cors(&server.allowed_origins)
    }
}

fn create_development_cors() -> Cors {
    tracing::debug!("Configuring permissive CORS for development");

    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::ORIGIN,
            header::USER_AGENT,
            header::HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers(vec![header::RETRY_AFTER, header::HeaderName::from_static("x-request-id")])
        .max_age(MAX_AGE_SECONDS)
}

fn create_restricted_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .expose_headers(vec![header::RETRY_AFTER, header::HeaderName::from_static("x-request-id")])
        .max_age(MAX_AGE_SECONDS);

    for origin in allowed_origins.iter().map(|o| o.trim()).filter(|o| !o.is_empty()) {
        tracing::info!(origin = %origin, "Allowing CORS origin");
        cors = cors.allowed_origin(origin);
    }

    cors
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    #[actix_web::test]
    async fn test_restricted_cors_allows_listed_origin() {
        let mut server = ServerConfig::default();
        server.allowed_origins = vec!["https://app.boardhub.example".to_string()];

        let app = test::init_service(
            App::new()
                .wrap(create_cors(&server, Environment::Production))
                .route("/", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((header::ORIGIN, "https://app.boardhub.example"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.boardhub.example"
        );
    }

    #[actix_web::test]
    async fn test_development_cors_allows_any_origin() {
        let app = test::init_service(
            App::new()
                .wrap(create_cors(&ServerConfig::default(), Environment::Development))
                .route("/", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((header::ORIGIN, "http://localhost:3000"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
