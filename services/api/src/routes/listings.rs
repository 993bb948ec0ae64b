use crate::auth::Authenticated;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use propease::domain::{Listing, ListingId, ListingStatus, NewListing};
use propease::services::{ServiceError, Services};
use serde::Deserialize;

pub(super) fn routes() -> Router<Services> {
    Router::new()
        .route("/listings", get(list).post(create))
        .route("/listings/:id", get(detail))
        .route("/listings/:id/status", put(set_status))
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChange<S> {
    pub(crate) status: S,
}

async fn create(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Json(listing): Json<NewListing>,
) -> Result<(StatusCode, Json<Listing>), ServiceError> {
    let listing = services.listings.create(&session, listing, Utc::now())?;
    Ok((StatusCode::CREATED, Json(listing)))
}

async fn list(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
) -> Result<Json<Vec<Listing>>, ServiceError> {
    Ok(Json(services.listings.list(&session)?))
}

async fn detail(
    State(services): State<Services>,
    Path(id): Path<ListingId>,
) -> Result<Json<Listing>, ServiceError> {
    Ok(Json(services.listings.get(&id)?))
}

async fn set_status(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<ListingId>,
    Json(change): Json<StatusChange<ListingStatus>>,
) -> Result<Json<Listing>, ServiceError> {
    Ok(Json(services.listings.set_status(&session, &id, change.status)?))
}
