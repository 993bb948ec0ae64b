use crate::auth::Authenticated;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use propease::domain::{ApplicationId, ListingId, RequestApplication};
use propease::services::{ServiceError, Services};
use propease::submission::AssembledSubmission;
use serde::Deserialize;

/// The same `:id` segment carries the public link id for tenants and the
/// internal id for the landlord's review actions.
pub(super) fn routes() -> Router<Services> {
    Router::new()
        .route("/applications", get(list).post(generate_link))
        .route("/applications/:id", get(open).post(submit))
        .route("/applications/:id/approve", post(approve))
        .route("/applications/:id/reject", post(reject))
        .route("/applications/:id/cancel", post(cancel))
}

#[derive(Debug, Deserialize)]
pub(crate) struct LinkRequest {
    pub(crate) listing_id: ListingId,
}

async fn generate_link(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Json(request): Json<LinkRequest>,
) -> Result<(StatusCode, Json<RequestApplication>), ServiceError> {
    let application = services
        .applications
        .generate_link(&session, &request.listing_id, Utc::now())?;
    Ok((StatusCode::CREATED, Json(application)))
}

async fn list(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
) -> Result<Json<Vec<RequestApplication>>, ServiceError> {
    Ok(Json(services.applications.list(&session)?))
}

async fn open(
    State(services): State<Services>,
    Path(public_id): Path<String>,
) -> Result<Json<RequestApplication>, ServiceError> {
    Ok(Json(services.applications.open(&public_id, Utc::now())?))
}

async fn submit(
    State(services): State<Services>,
    Path(public_id): Path<String>,
    Json(submission): Json<AssembledSubmission>,
) -> Result<Json<RequestApplication>, ServiceError> {
    Ok(Json(services.applications.submit(&public_id, &submission, Utc::now())?))
}

async fn approve(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<ApplicationId>,
) -> Result<Json<RequestApplication>, ServiceError> {
    Ok(Json(services.applications.approve(&session, &id, Utc::now())?))
}

async fn reject(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<ApplicationId>,
) -> Result<Json<RequestApplication>, ServiceError> {
    Ok(Json(services.applications.reject(&session, &id, Utc::now())?))
}

async fn cancel(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<ApplicationId>,
) -> Result<Json<RequestApplication>, ServiceError> {
    Ok(Json(services.applications.cancel(&session, &id)?))
}
