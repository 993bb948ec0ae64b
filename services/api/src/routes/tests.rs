use super::router;
use crate::infra::{in_memory_services, AppState, InMemoryNotifications};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::{Extension, Router};
use chrono::Duration;
use metrics_exporter_prometheus::PrometheusBuilder;
use propease::config::{
    AppConfig, AppEnvironment, LogFormat, ServerConfig, StorageConfig, TelemetryConfig,
    WorkflowConfig,
};
use serde_json::{json, Value};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tower::ServiceExt;

fn test_config() -> AppConfig {
    AppConfig {
        environment: AppEnvironment::Test,
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        },
        telemetry: TelemetryConfig {
            log_level: "info".to_string(),
            format: LogFormat::Compact,
        },
        storage: StorageConfig {
            public_base_url: "http://127.0.0.1:3000".to_string(),
            upload_url_ttl: Duration::minutes(15),
        },
        workflow: WorkflowConfig::default(),
        support_email: Some("help@propease.test".to_string()),
    }
}

fn app(ready: bool) -> Router {
    let config = test_config();
    let services = in_memory_services(&config, Arc::new(InMemoryNotifications::default()));
    let state = AppState {
        readiness: Arc::new(AtomicBool::new(ready)),
        metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        support_mailto: config.support_mailto(),
    };
    router(services).layer(Extension(state))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.expect("route executes");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    let payload = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, payload)
}

async fn sign_in(app: &Router, role: &str, name: &str, email: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "role": role, "name": name, "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, session) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    session["token"].as_str().expect("token issued").to_string()
}

fn token_of(url: &str) -> &str {
    url.rsplit('/').next().expect("token segment")
}

/// Presign as `token`, then PUT `bytes` to the returned upload URL.
async fn upload(
    app: &Router,
    token: &str,
    slug: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> Value {
    let (status, grant) = send(
        app,
        Method::GET,
        &format!("/upload/{slug}-upload-url?fileName={file_name}&fileType={content_type}"),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{grant}");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri(format!(
                    "/storage/upload/{}",
                    token_of(grant["uploadUrl"].as_str().unwrap())
                ))
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(bytes.to_vec()))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    grant
}

async fn fetch(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .expect("route executes");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    (status, bytes.to_vec())
}

/// Path part of an absolute URL handed out by the service.
fn path_of(url: &str) -> &str {
    url.strip_prefix("http://127.0.0.1:3000").expect("public base url")
}

/// Landlord with a listing and a tenant holding a signed lease on it.
async fn leased(app: &Router) -> (String, String, String) {
    let landlord = sign_in(app, "ADMIN", "Morgan Reyes", "morgan@propease.test").await;
    let tenant = sign_in(app, "TENANT", "Jordan Lee", "jordan@example.com").await;

    let (status, listing) = send(
        app,
        Method::POST,
        "/listings",
        Some(&landlord),
        Some(json!({
            "title": "Maple Court 2B",
            "address": "44 Maple Ct, Des Moines, IA",
            "rent": 145000,
            "property_type": "APARTMENT",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let document = upload(
        app,
        &landlord,
        "custom-lease",
        "maple.pdf",
        "application/pdf",
        b"%PDF-1.7",
    )
    .await;
    let (status, lease) = send(
        app,
        Method::POST,
        "/leases/custom",
        Some(&landlord),
        Some(json!({
            "listing_id": listing["id"],
            "tenant_name": "Jordan Lee",
            "tenant_email": "jordan@example.com",
            "start_date": "2025-11-01",
            "end_date": "2026-10-31",
            "rent": 145000,
            "security_deposit": 145000,
            "payment_due_day": 1,
            "late_fee": null,
            "document_url": document["fileUrl"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{lease}");

    let (status, invite) = send(
        app,
        Method::POST,
        "/leases-invite",
        Some(&landlord),
        Some(json!({ "lease_id": lease["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let sign_uri = format!("/leases-invite/{}/sign", invite["token"].as_str().unwrap());
    let (status, signed) = send(
        app,
        Method::POST,
        &sign_uri,
        Some(&tenant),
        Some(json!({ "signer_name": "Jordan Lee" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(signed["status"], "ACTIVE");

    let (status, _) = send(
        app,
        Method::POST,
        &sign_uri,
        None,
        Some(json!({ "signer_name": "Jordan Lee" })),
    )
    .await;
    assert_eq!(status, StatusCode::GONE);

    (landlord, tenant, lease["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn health_reports_support_contact() {
    let app = app(true);
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(
        body["support"],
        "mailto:help@propease.test?subject=PropEase%20support"
    );
}

#[tokio::test]
async fn readiness_reflects_startup_flag() {
    let (status, body) = send(&app(false), Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "initializing");

    let (status, _) = send(&app(true), Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = app(true);
    let (status, body) = send(&app, Method::GET, "/payments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["terminal"], false);

    let (status, _) = send(&app, Method::GET, "/payments", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_accounting_lists_every_category_at_zero() {
    let app = app(true);
    let landlord = sign_in(&app, "ADMIN", "Morgan Reyes", "morgan@propease.test").await;

    let (status, body) = send(&app, Method::GET, "/accounting/summary", Some(&landlord), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["emptyState"], "No payments found");
    assert_eq!(body["summary"]["collected"]["display"], "$0.00");
    let breakdown = body["summary"]["breakdown"].as_array().expect("breakdown");
    assert_eq!(breakdown.len(), 6);
    assert!(breakdown.iter().all(|category| category["display"] == "$0.00"));
    assert_eq!(body["filters"]["status"], "ALL");
}

#[tokio::test]
async fn unknown_filters_are_rejected() {
    let app = app(true);
    let landlord = sign_in(&app, "ADMIN", "Morgan Reyes", "morgan@propease.test").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/payments?status=LATE",
        Some(&landlord),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "unknown status filter 'LATE'");
}

#[tokio::test]
async fn receipt_approval_marks_payment_paid() {
    let app = app(true);
    let (landlord, tenant, lease_id) = leased(&app).await;

    let (status, payment) = send(
        &app,
        Method::POST,
        "/payments",
        Some(&landlord),
        Some(json!({
            "tenant_id": null,
            "lease_id": lease_id,
            "listing_id": null,
            "amount": 145000,
            "payment_type": "RENT",
            "due_date": "2025-11-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{payment}");
    assert_eq!(payment["status"], "PENDING");
    let payment_id = payment["id"].as_str().unwrap().to_string();

    let (status, refused) = send(
        &app,
        Method::POST,
        &format!("/payments/{payment_id}/submit-receipt"),
        Some(&tenant),
        Some(json!({ "receipt_url": "http://127.0.0.1:3000/files/receipt/forged.pdf" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        refused["fields"]["fields"]["receipt_url"],
        "Receipt must be a file you uploaded"
    );

    let grant = upload(
        &app,
        &tenant,
        "receipt",
        "november.pdf",
        "application/pdf",
        b"%PDF-1.7",
    )
    .await;
    let (status, submitted) = send(
        &app,
        Method::POST,
        &format!("/payments/{payment_id}/submit-receipt"),
        Some(&tenant),
        Some(json!({ "receipt_url": grant["fileUrl"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "PENDING");

    let (status, approved) = send(
        &app,
        Method::POST,
        &format!("/payments/{payment_id}/approve-receipt"),
        Some(&landlord),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "PAID");

    let (_, stored) = send(
        &app,
        Method::GET,
        &format!("/payments/{payment_id}"),
        Some(&tenant),
        None,
    )
    .await;
    assert_eq!(stored["status"], "PAID");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/payments/{payment_id}/approve-receipt"),
        Some(&landlord),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn oversized_profile_photos_are_refused_by_storage() {
    let app = app(true);
    let tenant = sign_in(&app, "TENANT", "Jordan Lee", "jordan@example.com").await;

    let (status, grant) = send(
        &app,
        Method::GET,
        "/upload/profile-photo-upload-url?fileName=me.png",
        Some(&tenant),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "file type guessed from the name");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri(format!(
                    "/storage/upload/{}",
                    token_of(grant["uploadUrl"].as_str().unwrap())
                ))
                .header(header::CONTENT_TYPE, "image/png")
                .body(Body::from(vec![0u8; 5 * 1024 * 1024 + 1]))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .expect("body readable");
    let body: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["error"], "Image size should be less than 5MB");
}

#[tokio::test]
async fn application_documents_upload_without_a_session() {
    let app = app(true);
    let (status, _) = send(
        &app,
        Method::GET,
        "/upload/application-document-upload-url?fileName=paystub.pdf&fileType=application/pdf",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::GET,
        "/upload/receipt-upload-url?fileName=paystub.pdf&fileType=application/pdf",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn far_pages_come_back_empty() {
    let app = app(true);
    let landlord = sign_in(&app, "ADMIN", "Morgan Reyes", "morgan@propease.test").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/payments?page=18446744073709551615&per_page=18446744073709551615",
        Some(&landlord),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["payments"]["items"], json!([]));
    assert_eq!(body["payments"]["perPage"], 100);
}

#[tokio::test]
async fn stored_files_are_readable_only_by_their_parties() {
    let app = app(true);
    let alice = sign_in(&app, "TENANT", "Alice Moreno", "alice@example.com").await;
    let mallory = sign_in(&app, "TENANT", "Mallory Quinn", "mallory@example.com").await;

    let grant = upload(
        &app,
        &alice,
        "insurance-document",
        "policy.pdf",
        "application/pdf",
        b"%PDF secret",
    )
    .await;
    let key = grant["key"].as_str().unwrap().to_string();
    let file_path = path_of(grant["fileUrl"].as_str().unwrap()).to_string();

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/upload/insurance-document-download-url?key={key}"),
        Some(&mallory),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/upload/receipt-download-url?key={key}"),
        Some(&mallory),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(fetch(&app, &file_path, Some(&mallory)).await.0, StatusCode::FORBIDDEN);
    assert_eq!(fetch(&app, &file_path, None).await.0, StatusCode::UNAUTHORIZED);

    let (status, download) = send(
        &app,
        Method::GET,
        &format!("/upload/insurance-document-download-url?key={key}"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, bytes) = fetch(&app, path_of(download["downloadUrl"].as_str().unwrap()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"%PDF secret".to_vec());

    let (status, bytes) = fetch(&app, &file_path, Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"%PDF secret".to_vec());
}
