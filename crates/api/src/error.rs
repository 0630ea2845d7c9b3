//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, InvoiceError, PaymentError};
use event_store::EventStoreError;
use settlement::SettlementError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Settlement flow error.
    Settlement(SettlementError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Settlement(err) => settlement_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Invoice(invoice_err) => match invoice_err {
            InvoiceError::InvalidStateTransition { .. }
            | InvoiceError::CannotModifyApprovedInvoice { .. }
            | InvoiceError::Overpayment { .. } => (StatusCode::CONFLICT, err.to_string()),
            InvoiceError::LineItemNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
            InvoiceError::AlreadyCreated
            | InvoiceError::CannotApproveEmptyInvoice
            | InvoiceError::InvalidPaymentAmount { .. }
            | InvoiceError::InvalidQuantity { .. }
            | InvoiceError::EmptyDescription
            | InvoiceError::ReasonRequired
            | InvoiceError::Money(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        },
        DomainError::Payment(payment_err) => match payment_err {
            PaymentError::InvalidStateTransition { .. } => {
                (StatusCode::CONFLICT, err.to_string())
            }
            PaymentError::AlreadyCreated
            | PaymentError::InvalidAmount { .. }
            | PaymentError::Money(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        },
        DomainError::Money(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::AggregateNotFound { .. } | DomainError::TenantMismatch { .. } => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn settlement_error_to_response(err: SettlementError) -> (StatusCode, String) {
    match err {
        SettlementError::PaymentNotFound(_) | SettlementError::InvoiceNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        SettlementError::PaymentNotSettleable { .. }
        | SettlementError::InvoiceCannotAccept { .. }
        | SettlementError::RetriesExhausted { .. } => (StatusCode::CONFLICT, err.to_string()),
        SettlementError::Domain(inner) => domain_error_to_response(inner),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<SettlementError> for ApiError {
    fn from(err: SettlementError) -> Self {
        ApiError::Settlement(err)
    }
}
