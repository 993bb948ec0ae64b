use crate::auth::{AuthRejection, Authenticated};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use propease::services::{ServiceError, Services};
use propease::uploads::{StoredObject, UploadKind, UploadReference};
use serde::Deserialize;

/// Largest body accepted on the storage PUT. Per-kind limits are enforced by
/// the upload service; this only has to clear the biggest of them.
const STORAGE_BODY_LIMIT: usize = 12 * 1024 * 1024;

pub(super) fn routes() -> Router<Services> {
    Router::new()
        .route("/upload/:endpoint", get(presign))
        .route(
            "/storage/upload/:token",
            put(store_object).layer(DefaultBodyLimit::max(STORAGE_BODY_LIMIT)),
        )
        .route("/storage/download/:token", get(fetch_object))
        .route("/files/*key", get(open_file))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Presign {
    Upload(UploadKind),
    Download(UploadKind),
}

/// Splits `profile-photo-upload-url` into the kind and direction.
pub(crate) fn parse_endpoint(endpoint: &str) -> Option<Presign> {
    if let Some(slug) = endpoint.strip_suffix("-upload-url") {
        return UploadKind::from_slug(slug).map(Presign::Upload);
    }
    endpoint
        .strip_suffix("-download-url")
        .and_then(UploadKind::from_slug)
        .map(Presign::Download)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct PresignQuery {
    pub(crate) file_name: Option<String>,
    pub(crate) file_type: Option<String>,
    pub(crate) key: Option<String>,
}

/// Application documents are uploaded through the public application link,
/// so they are the one kind that needs no session.
fn requires_session(kind: UploadKind) -> bool {
    kind != UploadKind::ApplicationDocument
}

async fn presign(
    State(services): State<Services>,
    caller: Option<Authenticated>,
    Path(endpoint): Path<String>,
    Query(query): Query<PresignQuery>,
) -> Result<Response, Response> {
    let presign = parse_endpoint(&endpoint)
        .ok_or_else(|| ServiceError::not_found("upload endpoint").into_response())?;
    let now = Utc::now();

    match presign {
        Presign::Upload(kind) => {
            if requires_session(kind) && caller.is_none() {
                return Err(AuthRejection.into_response());
            }
            let file_name = query.file_name.unwrap_or_default();
            let file_type = query
                .file_type
                .filter(|value| !value.trim().is_empty())
                .or_else(|| {
                    mime_guess::from_path(&file_name)
                        .first_raw()
                        .map(str::to_string)
                })
                .ok_or_else(|| {
                    ServiceError::Invalid("fileType is required".to_string()).into_response()
                })?;
            let owner = caller.map(|Authenticated(session)| session.user_id);
            let grant = services
                .uploads
                .presign_upload(kind, owner, &file_name, &file_type, now)
                .map_err(|err| ServiceError::from(err).into_response())?;
            Ok(Json(grant).into_response())
        }
        Presign::Download(kind) => {
            let Some(Authenticated(session)) = caller else {
                return Err(AuthRejection.into_response());
            };
            let key = query
                .key
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| ServiceError::Invalid("key is required".to_string()).into_response())?;
            let grant = services
                .files
                .presign_download(&session, kind, &key, now)
                .map_err(IntoResponse::into_response)?;
            Ok(Json(grant).into_response())
        }
    }
}

async fn store_object(
    State(services): State<Services>,
    Path(token): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadReference>, ServiceError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let reference = services
        .uploads
        .complete_upload(&token, content_type, body.to_vec(), Utc::now())?;
    Ok(Json(reference))
}

async fn fetch_object(
    State(services): State<Services>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let object = services.uploads.download(&token, Utc::now())?;
    Ok(serve(object))
}

/// The stable `fileUrl` handed out with every upload.
async fn open_file(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let object = services.files.open(&session, &key)?;
    Ok(serve(object))
}

fn serve(object: StoredObject) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, object.content_type)],
        object.bytes,
    )
}
