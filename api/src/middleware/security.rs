//! Security response headers
//!
//! Auth responses carry session tokens and verification state, so they are
//! never cached. HSTS is only sent outside development.

use actix_web::http::header;
use actix_web::middleware::DefaultHeaders;

use bh_shared::config::Environment;

pub fn security_headers(environment: Environment) -> DefaultHeaders {
    let headers = DefaultHeaders::new()
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::X_FRAME_OPTIONS, "DENY"))
        .add((header::REFERRER_POLICY, "no-referrer"))
        .add((header::CACHE_CONTROL, "no-store"));

    if environment.is_development() {
        headers
    } else {
        headers.add((
            header::STRICT_TRANSPORT_SECURITY,
            "max-age=31536000; includeSubDomains",
        ))
    }
}
