use crate::auth::Authenticated;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use propease::accounting::{
    AccountingSummary, AccountingView, FilterChoice, PaymentFilters, DEFAULT_PER_PAGE,
};
use propease::domain::{NewPayment, Payment, PaymentId};
use propease::services::{ServiceError, Services};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub(super) fn routes() -> Router<Services> {
    Router::new()
        .route("/payments", get(list).post(create))
        .route("/payments/:id", get(detail))
        .route("/payments/:id/mark-paid", post(mark_paid))
        .route("/payments/:id/mark-failed", post(mark_failed))
        .route("/payments/:id/rebill", post(rebill))
        .route("/payments/:id/cancel", post(cancel))
        .route("/payments/:id/submit-receipt", post(submit_receipt))
        .route("/payments/:id/approve-receipt", post(approve_receipt))
        .route("/payments/:id/reject-receipt", post(reject_receipt))
        .route("/accounting/summary", get(summary))
}

/// Query string of the accounting page. Every filter is optional; absent or
/// `ALL` means unfiltered.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AccountingQuery {
    pub(crate) status: Option<String>,
    #[serde(rename = "type")]
    pub(crate) payment_type: Option<String>,
    pub(crate) listing: Option<String>,
    pub(crate) month: Option<String>,
    pub(crate) page: Option<usize>,
    pub(crate) per_page: Option<usize>,
}

impl AccountingQuery {
    fn filters(&self) -> Result<PaymentFilters, ServiceError> {
        Ok(PaymentFilters {
            status: choice("status", self.status.as_deref())?,
            payment_type: choice("type", self.payment_type.as_deref())?,
            listing: choice("listing", self.listing.as_deref())?,
            month: choice("month", self.month.as_deref())?,
        })
    }
}

fn choice<T: DeserializeOwned>(name: &str, raw: Option<&str>) -> Result<FilterChoice<T>, ServiceError> {
    match raw.map(str::trim) {
        None | Some("") | Some("ALL") => Ok(FilterChoice::All),
        Some(value) => serde_json::from_value(serde_json::Value::String(value.to_string()))
            .map(FilterChoice::Only)
            .map_err(|_| ServiceError::Invalid(format!("unknown {name} filter '{value}'"))),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SummaryResponse {
    pub(crate) filters: PaymentFilters,
    pub(crate) summary: AccountingSummary,
    pub(crate) total_items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) empty_state: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReceiptRequest {
    pub(crate) receipt_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReasonRequest {
    pub(crate) reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RebillRequest {
    #[serde(default)]
    pub(crate) due_date: Option<NaiveDate>,
}

async fn create(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Json(request): Json<NewPayment>,
) -> Result<(StatusCode, Json<Payment>), ServiceError> {
    let payment = services.payments.create(&session, request, Utc::now())?;
    Ok((StatusCode::CREATED, Json(payment)))
}

fn accounting_view(
    services: &Services,
    session: &propease::session::Session,
    query: &AccountingQuery,
) -> Result<AccountingView, ServiceError> {
    services.payments.accounting(
        session,
        query.filters()?,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(DEFAULT_PER_PAGE),
        Utc::now().date_naive(),
    )
}

async fn list(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Query(query): Query<AccountingQuery>,
) -> Result<Json<AccountingView>, ServiceError> {
    Ok(Json(accounting_view(&services, &session, &query)?))
}

async fn summary(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Query(query): Query<AccountingQuery>,
) -> Result<Json<SummaryResponse>, ServiceError> {
    let view = accounting_view(&services, &session, &query)?;
    Ok(Json(SummaryResponse {
        filters: view.filters,
        summary: view.summary,
        total_items: view.payments.total_items,
        empty_state: view.empty_state,
    }))
}

async fn detail(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<PaymentId>,
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(services.payments.get(&session, &id)?))
}

async fn mark_paid(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<PaymentId>,
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(services.payments.mark_paid(&session, &id, Utc::now().date_naive())?))
}

async fn mark_failed(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<PaymentId>,
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(services.payments.mark_failed(&session, &id)?))
}

async fn rebill(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<PaymentId>,
    Json(request): Json<RebillRequest>,
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(services.payments.rebill(&session, &id, request.due_date)?))
}

async fn cancel(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<PaymentId>,
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(services.payments.cancel(&session, &id)?))
}

async fn submit_receipt(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<PaymentId>,
    Json(request): Json<ReceiptRequest>,
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(services.payments.submit_receipt(
        &session,
        &id,
        &request.receipt_url,
        Utc::now(),
    )?))
}

async fn approve_receipt(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<PaymentId>,
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(services.payments.approve_receipt(&session, &id, Utc::now())?))
}

async fn reject_receipt(
    State(services): State<Services>,
    Authenticated(session): Authenticated,
    Path(id): Path<PaymentId>,
    Json(request): Json<ReasonRequest>,
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(services.payments.reject_receipt(
        &session,
        &id,
        &request.reason,
        Utc::now(),
    )?))
}
