use crate::auth::Authenticated;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use propease::domain::{Notification, NotificationId, ProfileUpdate, User};
use propease::services::{NewUser, ServiceError, Services};
use propease::session::Session;
use serde::Deserialize;

pub(super) fn routes() -> Router<Services> {
    Router::new()
        .route("/users", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/user/profile", get(profile).put(update_profile))
        .route("/notifications", get(inbox))
        .route("/notifications/:id/read", post(mark_read))
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
}

async fn register(
    State(services): State<Services>,
    Json(request): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ServiceError> {
    let user = services.users.register(request, Utc::now())?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(services): State<Services>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Session>, ServiceError> {
    Ok(Json(services.users.login(&request.email, Utc::now())?))
}

async fn logout(State(services): State<Services>, Authenticated(session): Authenticated) -> StatusCode {
    services.users.logout(&session);
    StatusCode::NO_CONTENT
}

async fn profile(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
) -> Result<Json<User>, ServiceError> {
    Ok(Json(services.users.profile(&session)?))
}

async fn update_profile(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, ServiceError> {
    Ok(Json(services.users.update_profile(&session, update)?))
}

async fn inbox(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
) -> Result<Json<Vec<Notification>>, ServiceError> {
    Ok(Json(services.notifications.inbox(&session)?))
}

async fn mark_read(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode, ServiceError> {
    services.notifications.mark_read(&session, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
