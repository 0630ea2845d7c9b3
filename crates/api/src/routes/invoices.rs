//! Invoice command and query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use domain::{
    AddLineItem, Aggregate, ApproveInvoice, CancelInvoice, CreateInvoice, Currency, CustomerId,
    Invoice, InvoiceStatus, LineItem, Money, RemoveLineItem, VatCategory, VendorId,
};
use event_store::EventStore;
use projections::{InvoiceLedgerRow, Page};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::{Actor, AppState, Tenant, parse_aggregate_id};

// -- Request types --

#[derive(Deserialize)]
pub struct LineItemRequest {
    pub description: String,
    pub quantity: u32,
    pub unit_price_minor: i64,
    /// ISO 4217 code; defaults to BDT.
    pub currency: Option<String>,
    /// "standard" (15%), "reduced" (7.5%), or "zero".
    pub vat_category: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateInvoiceRequest {
    pub customer_id: String,
    pub vendor_id: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub line_items: Vec<LineItemRequest>,
}

#[derive(Deserialize)]
pub struct CancelInvoiceRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

// -- Response types --

#[derive(Serialize)]
pub struct LineItemResponse {
    pub description: String,
    pub quantity: u32,
    pub unit_price_minor: i64,
    pub vat_category: String,
}

#[derive(Serialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub status: String,
    pub customer_id: String,
    pub vendor_id: String,
    pub currency: String,
    pub subtotal_minor: i64,
    pub vat_minor: i64,
    pub grand_total_minor: i64,
    pub paid_minor: i64,
    pub balance_minor: i64,
    pub mushak_number: Option<String>,
    pub fiscal_year: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<String>,
    pub cancelled_reason: Option<String>,
    pub line_items: Vec<LineItemResponse>,
}

#[derive(Serialize)]
pub struct InvoiceSummaryResponse {
    pub id: String,
    pub status: String,
    pub customer_id: String,
    pub currency: String,
    pub grand_total_minor: i64,
    pub paid_minor: i64,
    pub balance_minor: i64,
    pub mushak_number: Option<String>,
    pub fiscal_year: String,
    pub line_item_count: usize,
}

#[derive(Serialize)]
pub struct InvoiceCreatedResponse {
    pub invoice_id: String,
    pub status: String,
    pub grand_total_minor: i64,
}

// -- Conversions --

fn parse_vat_category(raw: Option<&str>) -> Result<VatCategory, ApiError> {
    match raw.map(|s| s.to_ascii_lowercase()).as_deref() {
        None | Some("standard") => Ok(VatCategory::Standard),
        Some("reduced") => Ok(VatCategory::Reduced),
        Some("zero") => Ok(VatCategory::Zero),
        Some(other) => Err(ApiError::BadRequest(format!(
            "Unknown VAT category: {other}"
        ))),
    }
}

fn parse_currency(raw: Option<&str>) -> Result<Currency, ApiError> {
    match raw {
        None => Ok(Currency::Bdt),
        Some(code) => Currency::from_code(code)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown currency: {code}"))),
    }
}

fn parse_status(raw: &str) -> Result<InvoiceStatus, ApiError> {
    match raw.to_ascii_lowercase().as_str() {
        "draft" => Ok(InvoiceStatus::Draft),
        "approved" => Ok(InvoiceStatus::Approved),
        "paid" => Ok(InvoiceStatus::Paid),
        "cancelled" => Ok(InvoiceStatus::Cancelled),
        other => Err(ApiError::BadRequest(format!("Unknown status: {other}"))),
    }
}

fn to_line_item(req: &LineItemRequest) -> Result<LineItem, ApiError> {
    let currency = parse_currency(req.currency.as_deref())?;
    let unit_price = Money::new(req.unit_price_minor, currency)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(LineItem::new(
        req.description.clone(),
        req.quantity,
        unit_price,
        parse_vat_category(req.vat_category.as_deref())?,
    ))
}

fn to_invoice_response(invoice: &Invoice) -> InvoiceResponse {
    InvoiceResponse {
        id: invoice
            .id()
            .map(|id| id.to_string())
            .unwrap_or_default(),
        status: invoice.status().to_string(),
        customer_id: invoice
            .customer_id()
            .map(|id| id.to_string())
            .unwrap_or_default(),
        vendor_id: invoice
            .vendor_id()
            .map(|id| id.to_string())
            .unwrap_or_default(),
        currency: invoice.currency().code().to_string(),
        subtotal_minor: invoice.subtotal().minor(),
        vat_minor: invoice.vat_amount().minor(),
        grand_total_minor: invoice.grand_total().minor(),
        paid_minor: invoice.paid_amount().minor(),
        balance_minor: invoice.balance().minor(),
        mushak_number: invoice.mushak_number().map(String::from),
        fiscal_year: invoice.fiscal_year().map(String::from),
        invoice_date: invoice.invoice_date(),
        due_date: invoice.due_date(),
        paid_at: invoice.paid_at().map(|t| t.to_rfc3339()),
        cancelled_reason: invoice.cancellation_reason().map(String::from),
        line_items: invoice
            .line_items()
            .iter()
            .map(|item| LineItemResponse {
                description: item.description.clone(),
                quantity: item.quantity,
                unit_price_minor: item.unit_price.minor(),
                vat_category: item.vat_category.to_string(),
            })
            .collect(),
    }
}

fn to_summary_response(row: &InvoiceLedgerRow) -> InvoiceSummaryResponse {
    InvoiceSummaryResponse {
        id: row.invoice_id.to_string(),
        status: row.status.to_string(),
        customer_id: row.customer_id.to_string(),
        currency: row.currency.code().to_string(),
        grand_total_minor: row.grand_total.minor(),
        paid_minor: row.paid_amount.minor(),
        balance_minor: row.balance_amount.minor(),
        mushak_number: row.mushak_number.clone(),
        fiscal_year: row.fiscal_year.clone(),
        line_item_count: row.line_item_count,
    }
}

// -- Handlers --

/// POST /invoices — create a new invoice in Draft.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Tenant(tenant_id): Tenant,
    Actor(user_id): Actor,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceCreatedResponse>), ApiError> {
    let customer_id = uuid::Uuid::parse_str(&req.customer_id)
        .map(CustomerId::from_uuid)
        .map_err(|e| ApiError::BadRequest(format!("Invalid customer_id: {e}")))?;
    let vendor_id = uuid::Uuid::parse_str(&req.vendor_id)
        .map(VendorId::from_uuid)
        .map_err(|e| ApiError::BadRequest(format!("Invalid vendor_id: {e}")))?;

    let line_items = req
        .line_items
        .iter()
        .map(to_line_item)
        .collect::<Result<Vec<_>, _>>()?;

    let cmd = CreateInvoice::new(
        tenant_id,
        customer_id,
        vendor_id,
        req.invoice_date,
        req.due_date,
        line_items,
        user_id,
    );
    let invoice_id = cmd.invoice_id;

    let result = state.invoice_service.create_invoice(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(InvoiceCreatedResponse {
            invoice_id: invoice_id.to_string(),
            status: result.aggregate.status().to_string(),
            grand_total_minor: result.aggregate.grand_total().minor(),
        }),
    ))
}

/// GET /invoices/{id} — load an invoice through its event stream (strong
/// read).
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Tenant(tenant_id): Tenant,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice_id = parse_aggregate_id(&id)?;
    let invoice = state
        .invoice_service
        .get_invoice(tenant_id, invoice_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Invoice {id} not found")))?;

    Ok(Json(to_invoice_response(&invoice)))
}

/// GET /invoices — list a tenant's invoices from the projection
/// (eventually consistent).
#[tracing::instrument(skip(state))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Tenant(tenant_id): Tenant,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<InvoiceSummaryResponse>>, ApiError> {
    // Bring the read model up to date with any events appended outside
    // the in-process publisher (e.g. after a restart).
    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let page = Page::new(
        query.offset.unwrap_or(0),
        query.limit.unwrap_or(Page::default().limit),
    );

    let rows = match query.status.as_deref() {
        Some(raw) => {
            let status = parse_status(raw)?;
            state
                .invoice_view
                .list_by_status(tenant_id, status, page)
                .await
        }
        None => state.invoice_view.list(tenant_id, page).await,
    };

    Ok(Json(rows.iter().map(to_summary_response).collect()))
}

/// POST /invoices/{id}/line-items — add a line item to a Draft invoice.
#[tracing::instrument(skip(state, req))]
pub async fn add_line_item<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Tenant(tenant_id): Tenant,
    Actor(_user_id): Actor,
    Path(id): Path<String>,
    Json(req): Json<LineItemRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice_id = parse_aggregate_id(&id)?;
    let item = to_line_item(&req)?;

    let result = state
        .invoice_service
        .add_line_item(AddLineItem::new(invoice_id, tenant_id, item))
        .await?;

    Ok(Json(to_invoice_response(&result.aggregate)))
}

/// DELETE /invoices/{id}/line-items/{index} — remove a line item from a
/// Draft invoice.
#[tracing::instrument(skip(state))]
pub async fn remove_line_item<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Tenant(tenant_id): Tenant,
    Actor(_user_id): Actor,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice_id = parse_aggregate_id(&id)?;

    let result = state
        .invoice_service
        .remove_line_item(RemoveLineItem::new(invoice_id, tenant_id, index))
        .await?;

    Ok(Json(to_invoice_response(&result.aggregate)))
}

/// POST /invoices/{id}/approve — approve an invoice, issuing its Mushak
/// number. Idempotent: approving twice returns the same state.
#[tracing::instrument(skip(state))]
pub async fn approve<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Tenant(tenant_id): Tenant,
    Actor(user_id): Actor,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice_id = parse_aggregate_id(&id)?;

    let result = state
        .invoice_service
        .approve_invoice(ApproveInvoice::new(invoice_id, tenant_id, user_id))
        .await?;

    Ok(Json(to_invoice_response(&result.aggregate)))
}

/// POST /invoices/{id}/cancel — cancel an invoice with a required reason.
#[tracing::instrument(skip(state, req))]
pub async fn cancel<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Tenant(tenant_id): Tenant,
    Actor(user_id): Actor,
    Path(id): Path<String>,
    Json(req): Json<CancelInvoiceRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice_id = parse_aggregate_id(&id)?;

    let result = state
        .invoice_service
        .cancel_invoice(CancelInvoice::new(
            invoice_id, tenant_id, req.reason, user_id,
        ))
        .await?;

    Ok(Json(to_invoice_response(&result.aggregate)))
}
