use super::listings::StatusChange;
use super::payments::ReasonRequest;
use crate::auth::Authenticated;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use propease::domain::{
    Insurance, InsuranceId, MaintenanceId, MaintenanceRequest, MaintenanceStatus, NewInsurance,
    NewMaintenanceRequest,
};
use propease::services::{ServiceError, Services};

/// Maintenance tickets and renters insurance, the two tenant-raised records
/// a landlord reviews.
pub(super) fn routes() -> Router<Services> {
    Router::new()
        .route("/maintenance", get(list_maintenance).post(create_maintenance))
        .route("/maintenance/:id/status", post(update_maintenance))
        .route("/insurance", get(list_insurance).post(submit_insurance))
        .route("/insurance/:id/verify", post(verify_insurance))
        .route("/insurance/:id/reject", post(reject_insurance))
}

async fn create_maintenance(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Json(request): Json<NewMaintenanceRequest>,
) -> Result<(StatusCode, Json<MaintenanceRequest>), ServiceError> {
    let ticket = services.maintenance.create(&session, request, Utc::now())?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn list_maintenance(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
) -> Result<Json<Vec<MaintenanceRequest>>, ServiceError> {
    Ok(Json(services.maintenance.list(&session)?))
}

async fn update_maintenance(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<MaintenanceId>,
    Json(change): Json<StatusChange<MaintenanceStatus>>,
) -> Result<Json<MaintenanceRequest>, ServiceError> {
    Ok(Json(services.maintenance.update_status(
        &session,
        &id,
        change.status,
        Utc::now(),
    )?))
}

async fn submit_insurance(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Json(policy): Json<NewInsurance>,
) -> Result<(StatusCode, Json<Insurance>), ServiceError> {
    let policy = services.insurance.submit(&session, policy)?;
    Ok((StatusCode::CREATED, Json(policy)))
}

async fn list_insurance(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
) -> Result<Json<Vec<Insurance>>, ServiceError> {
    Ok(Json(services.insurance.list(&session, Utc::now().date_naive())?))
}

async fn verify_insurance(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<InsuranceId>,
) -> Result<Json<Insurance>, ServiceError> {
    Ok(Json(services.insurance.verify(&session, &id, Utc::now())?))
}

async fn reject_insurance(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<InsuranceId>,
    Json(request): Json<ReasonRequest>,
) -> Result<Json<Insurance>, ServiceError> {
    Ok(Json(services.insurance.reject(
        &session,
        &id,
        &request.reason,
        Utc::now(),
    )?))
}
