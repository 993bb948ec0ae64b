use crate::auth::Authenticated;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use propease::domain::{Lease, LeaseId, LeaseInvite};
use propease::services::{CustomLeaseRequest, InviteView, ServiceError, Services, SignLease};
use propease::submission::AssembledSubmission;
use serde::Deserialize;

pub(super) fn routes() -> Router<Services> {
    Router::new()
        .route("/leases", get(list).post(create_standard))
        .route("/leases/custom", post(create_custom))
        .route("/leases/:id", get(detail))
        .route("/leases/:id/terminate", post(terminate))
        .route("/leases-invite", post(invite))
        .route("/leases-invite/:token", get(open_invite))
        .route("/leases-invite/:token/sign", post(sign))
}

#[derive(Debug, Deserialize)]
pub(crate) struct InviteRequest {
    pub(crate) lease_id: LeaseId,
}

async fn create_standard(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Json(submission): Json<AssembledSubmission>,
) -> Result<(StatusCode, Json<Lease>), ServiceError> {
    let lease = services
        .leases
        .create_standard(&session, &submission, Utc::now())?;
    Ok((StatusCode::CREATED, Json(lease)))
}

async fn create_custom(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Json(request): Json<CustomLeaseRequest>,
) -> Result<(StatusCode, Json<Lease>), ServiceError> {
    let lease = services.leases.create_custom(&session, request, Utc::now())?;
    Ok((StatusCode::CREATED, Json(lease)))
}

async fn list(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
) -> Result<Json<Vec<Lease>>, ServiceError> {
    Ok(Json(services.leases.list(&session)?))
}

async fn detail(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<LeaseId>,
) -> Result<Json<Lease>, ServiceError> {
    Ok(Json(services.leases.get(&session, &id)?))
}

async fn terminate(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<LeaseId>,
) -> Result<Json<Lease>, ServiceError> {
    Ok(Json(services.leases.terminate(&session, &id)?))
}

async fn invite(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Json(request): Json<InviteRequest>,
) -> Result<(StatusCode, Json<LeaseInvite>), ServiceError> {
    let invite = services
        .leases
        .invite(&session, &request.lease_id, Utc::now())?;
    Ok((StatusCode::CREATED, Json(invite)))
}

async fn open_invite(
    State(services): State<Services>,
    Path(token): Path<String>,
) -> Result<Json<InviteView>, ServiceError> {
    Ok(Json(services.leases.open_invite(&token, Utc::now())?))
}

/// Signing works from the emailed link alone; a signed-in tenant is linked
/// to the lease directly.
async fn sign(
    State(services): State<Services>,
    signer: Option<Authenticated>,
    Path(token): Path<String>,
    Json(request): Json<SignLease>,
) -> Result<Json<Lease>, ServiceError> {
    let session = signer.map(|Authenticated(session)| session);
    Ok(Json(services.leases.sign(
        &token,
        session.as_ref(),
        request,
        Utc::now(),
    )?))
}
