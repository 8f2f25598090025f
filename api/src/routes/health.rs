use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use bh_infra::run_check;
use bh_shared::types::HealthStatus;

use crate::state::AppState;

/// Handler for GET /health
///
/// Checks every configured backend; any unhealthy one turns the overall
/// status unhealthy and the response into a 503.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let mut services = HashMap::new();
    for check in &state.health_checks {
        services.insert(check.name(), run_check(check.as_ref()).await);
    }

    let status = if services.values().all(|s| s.status == HealthStatus::Healthy) {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };

    let now = Utc::now();
    let body = json!({
        "status": status,
        "service": "boardhub-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": now.to_rfc3339(),
        "uptime_seconds": (now - state.started_at).num_seconds(),
        "services": services,
    });

    match status {
        HealthStatus::Healthy => HttpResponse::Ok().json(body),
        HealthStatus::Unhealthy => HttpResponse::ServiceUnavailable().json(body),
    }
}
