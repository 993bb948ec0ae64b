use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use propease::services::Services;
use propease::session::Session;
use serde_json::json;

/// Session resolved from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub(crate) struct Authenticated(pub(crate) Session);

#[derive(Debug)]
pub(crate) struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": "sign in required",
            "terminal": false,
        }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    Services: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthRejection)?;

        let services = Services::from_ref(state);
        services
            .users
            .authenticate(token)
            .map(Authenticated)
            .ok_or(AuthRejection)
    }
}
