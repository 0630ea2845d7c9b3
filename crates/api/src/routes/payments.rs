//! Payment command and query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use domain::{
    Aggregate, CreatePayment, Currency, Money, Payment, PaymentMethod, PaymentStatus,
    WalletProvider,
};
use event_store::EventStore;
use projections::{Page, PaymentLedgerRow};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::{Actor, AppState, Tenant, parse_aggregate_id};

// -- Request types --

#[derive(Deserialize)]
pub struct CreatePaymentRequest {
    pub invoice_id: String,
    pub amount_minor: i64,
    /// ISO 4217 code; defaults to BDT.
    pub currency: Option<String>,
    /// "bank_transfer", "mobile_wallet", "cheque", or "cash".
    pub method: String,
    /// Wallet provider when method is "mobile_wallet":
    /// "bkash", "nagad", "rocket", or "upay".
    pub wallet_provider: Option<String>,
    pub payment_date: NaiveDate,
    pub reference: Option<String>,
}

#[derive(Deserialize)]
pub struct CompletePaymentRequest {
    pub transaction_id: String,
}

#[derive(Deserialize)]
pub struct FailPaymentRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub invoice_id: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

// -- Response types --

#[derive(Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub invoice_id: String,
    pub status: String,
    pub amount_minor: i64,
    pub currency: String,
    pub method: String,
    pub transaction_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub reference: Option<String>,
}

#[derive(Serialize)]
pub struct PaymentCreatedResponse {
    pub payment_id: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct SettlementResponse {
    pub payment_id: String,
    pub payment_status: String,
    pub invoice_id: String,
    pub invoice_status: String,
    pub paid_minor: i64,
    pub balance_minor: i64,
}

// -- Conversions --

fn parse_method(
    method: &str,
    wallet_provider: Option<&str>,
) -> Result<PaymentMethod, ApiError> {
    match method.to_ascii_lowercase().as_str() {
        "bank_transfer" => Ok(PaymentMethod::BankTransfer),
        "cheque" => Ok(PaymentMethod::Cheque),
        "cash" => Ok(PaymentMethod::Cash),
        "mobile_wallet" => {
            let provider = match wallet_provider.map(|p| p.to_ascii_lowercase()).as_deref() {
                Some("bkash") => WalletProvider::Bkash,
                Some("nagad") => WalletProvider::Nagad,
                Some("rocket") => WalletProvider::Rocket,
                Some("upay") => WalletProvider::Upay,
                Some(other) => {
                    return Err(ApiError::BadRequest(format!(
                        "Unknown wallet provider: {other}"
                    )));
                }
                None => {
                    return Err(ApiError::BadRequest(
                        "mobile_wallet requires wallet_provider".to_string(),
                    ));
                }
            };
            Ok(PaymentMethod::MobileWallet { provider })
        }
        other => Err(ApiError::BadRequest(format!(
            "Unknown payment method: {other}"
        ))),
    }
}

fn parse_status(raw: &str) -> Result<PaymentStatus, ApiError> {
    match raw.to_ascii_lowercase().as_str() {
        "pending" => Ok(PaymentStatus::Pending),
        "completed" => Ok(PaymentStatus::Completed),
        "failed" => Ok(PaymentStatus::Failed),
        other => Err(ApiError::BadRequest(format!("Unknown status: {other}"))),
    }
}

fn to_payment_response(payment: &Payment) -> PaymentResponse {
    PaymentResponse {
        id: payment
            .id()
            .map(|id| id.to_string())
            .unwrap_or_default(),
        invoice_id: payment
            .invoice_id()
            .map(|id| id.to_string())
            .unwrap_or_default(),
        status: payment.status().to_string(),
        amount_minor: payment.amount().minor(),
        currency: payment.amount().currency().code().to_string(),
        method: payment
            .method()
            .map(|m| m.to_string())
            .unwrap_or_default(),
        transaction_reference: payment.transaction_reference().map(String::from),
        failure_reason: payment.failure_reason().map(String::from),
        payment_date: payment.payment_date(),
        reference: payment.reference().map(String::from),
    }
}

fn row_to_response(row: &PaymentLedgerRow) -> PaymentResponse {
    PaymentResponse {
        id: row.payment_id.to_string(),
        invoice_id: row.invoice_id.to_string(),
        status: row.status.to_string(),
        amount_minor: row.amount.minor(),
        currency: row.amount.currency().code().to_string(),
        method: row.method.to_string(),
        transaction_reference: row.transaction_reference.clone(),
        failure_reason: row.failure_reason.clone(),
        payment_date: Some(row.payment_date),
        reference: row.reference.clone(),
    }
}

// -- Handlers --

/// POST /payments — create a payment in Pending against an invoice.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Tenant(tenant_id): Tenant,
    Actor(user_id): Actor,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentCreatedResponse>), ApiError> {
    let invoice_id = parse_aggregate_id(&req.invoice_id)?;

    let currency = match req.currency.as_deref() {
        None => Currency::Bdt,
        Some(code) => Currency::from_code(code)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown currency: {code}")))?,
    };
    let amount = Money::new(req.amount_minor, currency)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let method = parse_method(&req.method, req.wallet_provider.as_deref())?;

    let cmd = CreatePayment::new(
        tenant_id,
        invoice_id,
        amount,
        method,
        req.payment_date,
        req.reference,
        user_id,
    );
    let payment_id = cmd.payment_id;

    let result = state.payment_service.create_payment(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(PaymentCreatedResponse {
            payment_id: payment_id.to_string(),
            status: result.aggregate.status().to_string(),
        }),
    ))
}

/// GET /payments/{id} — load a payment through its event stream (strong
/// read).
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Tenant(tenant_id): Tenant,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment_id = parse_aggregate_id(&id)?;
    let payment = state
        .payment_service
        .get_payment(tenant_id, payment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Payment {id} not found")))?;

    Ok(Json(to_payment_response(&payment)))
}

/// GET /payments — list a tenant's payments from the projection
/// (eventually consistent).
#[tracing::instrument(skip(state))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Tenant(tenant_id): Tenant,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let page = Page::new(
        query.offset.unwrap_or(0),
        query.limit.unwrap_or(Page::default().limit),
    );

    let rows = if let Some(raw) = query.invoice_id.as_deref() {
        let invoice_id = parse_aggregate_id(raw)?;
        state
            .payment_view
            .list_by_invoice(tenant_id, invoice_id, page)
            .await
    } else if let Some(raw) = query.status.as_deref() {
        let status = parse_status(raw)?;
        state
            .payment_view
            .list_by_status(tenant_id, status, page)
            .await
    } else {
        state.payment_view.list(tenant_id, page).await
    };

    Ok(Json(rows.iter().map(row_to_response).collect()))
}

/// POST /payments/{id}/complete — settle the payment and record it against
/// its invoice (the two-aggregate flow).
#[tracing::instrument(skip(state, req))]
pub async fn complete<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Tenant(tenant_id): Tenant,
    Actor(user_id): Actor,
    Path(id): Path<String>,
    Json(req): Json<CompletePaymentRequest>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let payment_id = parse_aggregate_id(&id)?;

    let outcome = state
        .settlement
        .settle_payment(tenant_id, payment_id, req.transaction_id, user_id)
        .await?;

    Ok(Json(SettlementResponse {
        payment_id: payment_id.to_string(),
        payment_status: outcome.payment.status().to_string(),
        invoice_id: outcome
            .invoice
            .id()
            .map(|id| id.to_string())
            .unwrap_or_default(),
        invoice_status: outcome.invoice.status().to_string(),
        paid_minor: outcome.invoice.paid_amount().minor(),
        balance_minor: outcome.invoice.balance().minor(),
    }))
}

/// POST /payments/{id}/fail — fail the payment. The invoice is untouched.
#[tracing::instrument(skip(state, req))]
pub async fn fail<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Tenant(tenant_id): Tenant,
    Actor(user_id): Actor,
    Path(id): Path<String>,
    Json(req): Json<FailPaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment_id = parse_aggregate_id(&id)?;

    let payment = state
        .settlement
        .decline_payment(tenant_id, payment_id, req.reason, user_id)
        .await?;

    Ok(Json(to_payment_response(&payment)))
}
