//! Health check endpoint.
//!
//! Reports the Task Store and the Job Registry. The store is probed with a
//! round trip; the registry is reported with its live timer count.

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{ComponentHealth, HealthResponse, HealthStatus};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use jiff::Timestamp;
use std::collections::HashMap;
use std::time::Instant;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(health_check))
}

/// GET /api/health - Store connectivity and scheduler state
#[utoipa::path(
    get,
    path = "/health",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    )
)]
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mut checks = HashMap::new();
    checks.insert("store".to_string(), check_store(&state).await);
    checks.insert(
        "scheduler".to_string(),
        ComponentHealth {
            status: HealthStatus::Healthy,
            message: Some(format!("{} timer(s) registered", state.registry.len())),
            response_time_ms: None,
        },
    );

    let unhealthy = checks
        .values()
        .any(|c| matches!(c.status, HealthStatus::Unhealthy));
    let (status_code, status) = if unhealthy {
        (StatusCode::SERVICE_UNAVAILABLE, HealthStatus::Unhealthy)
    } else {
        (StatusCode::OK, HealthStatus::Healthy)
    };

    let response = HealthResponse {
        status,
        version: crate::pkg_version().to_string(),
        timestamp: Timestamp::now().to_string(),
        checks,
    };

    (status_code, Json(response))
}

async fn check_store(state: &AppState) -> ComponentHealth {
    let start = Instant::now();
    let result = state.store.ping().await;
    let response_time_ms = Some(start.elapsed().as_millis() as u64);

    match result {
        Ok(()) => ComponentHealth {
            status: HealthStatus::Healthy,
            message: Some("Connected".to_string()),
            response_time_ms,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Health check: task store unreachable");
            ComponentHealth {
                status: HealthStatus::Unhealthy,
                message: Some(format!("Store unavailable: {}", e)),
                response_time_ms,
            }
        }
    }
}
