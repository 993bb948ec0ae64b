mod accounts;
mod applications;
mod leases;
mod listings;
mod payments;
mod uploads;
mod workorders;

#[cfg(test)]
mod tests;

use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json, Router};
use propease::services::Services;
use serde_json::json;

/// Every HTTP endpoint of the service, bound to `services`.
pub(crate) fn router(services: Services) -> Router {
    Router::new()
        .merge(accounts::routes())
        .merge(listings::routes())
        .merge(applications::routes())
        .merge(leases::routes())
        .merge(payments::routes())
        .merge(workorders::routes())
        .merge(uploads::routes())
        .with_state(services)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck(Extension(state): Extension<AppState>) -> Json<serde_json::Value> {
    match state.support_mailto {
        Some(mailto) => Json(json!({ "status": "ok", "support": mailto })),
        None => Json(json!({ "status": "ok" })),
    }
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
