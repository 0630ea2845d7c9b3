//! Route handlers and shared request plumbing.

pub mod health;
pub mod invoices;
pub mod metrics;
pub mod payments;

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{TenantId, UserId};
use domain::{InvoiceService, PaymentService};
use event_store::EventStore;
use projections::{InvoiceLedgerView, PaymentLedgerView, ProjectionProcessor};
use settlement::SettlementCoordinator;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
///
/// Built once at startup; this is the explicit registry wiring commands to
/// their handlers — there is no reflection-driven auto-registration.
pub struct AppState<S: EventStore> {
    pub invoice_service: InvoiceService<S>,
    pub payment_service: PaymentService<S>,
    pub settlement: SettlementCoordinator<S>,
    pub invoice_view: Arc<InvoiceLedgerView>,
    pub payment_view: Arc<PaymentLedgerView>,
    pub event_store: S,
    pub projection_processor: Arc<ProjectionProcessor<S>>,
}

/// Tenant extractor: reads `X-Tenant-Id` and fails closed when it is
/// missing or malformed.
///
/// The header is set by the authentication middleware in front of this
/// service; the core never infers the tenant from any other signal.
#[derive(Debug, Clone, Copy)]
pub struct Tenant(pub TenantId);

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get("x-tenant-id")
            .ok_or_else(|| ApiError::BadRequest("Missing X-Tenant-Id header".to_string()))?;

        let raw = value
            .to_str()
            .map_err(|_| ApiError::BadRequest("Invalid X-Tenant-Id header".to_string()))?;

        let uuid = uuid::Uuid::parse_str(raw)
            .map_err(|e| ApiError::BadRequest(format!("Invalid X-Tenant-Id header: {e}")))?;

        Ok(Tenant(TenantId::from_uuid(uuid)))
    }
}

/// Acting-user extractor: reads `X-User-Id`, also supplied by the
/// authentication middleware. Required on every command route.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub UserId);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get("x-user-id")
            .ok_or_else(|| ApiError::BadRequest("Missing X-User-Id header".to_string()))?;

        let raw = value
            .to_str()
            .map_err(|_| ApiError::BadRequest("Invalid X-User-Id header".to_string()))?;

        let uuid = uuid::Uuid::parse_str(raw)
            .map_err(|e| ApiError::BadRequest(format!("Invalid X-User-Id header: {e}")))?;

        Ok(Actor(UserId::from_uuid(uuid)))
    }
}

/// Parses a path segment as an aggregate ID.
pub(crate) fn parse_aggregate_id(raw: &str) -> Result<common::AggregateId, ApiError> {
    let uuid = uuid::Uuid::parse_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid id: {e}")))?;
    Ok(common::AggregateId::from_uuid(uuid))
}
