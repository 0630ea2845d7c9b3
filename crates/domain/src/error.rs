//! Domain error types.

use common::TenantId;
use event_store::EventStoreError;
use thiserror::Error;

use crate::invoice::InvoiceError;
use crate::money::MoneyError;
use crate::payment::PaymentError;

/// Errors that can occur during domain operations.
///
/// Business-rule violations (`Invoice`, `Payment`, `Money`) leave the
/// aggregate unchanged and emit no event. `EventStore` carries both
/// concurrency conflicts (reload and retry at the caller's discretion) and
/// infrastructure failures (retry with backoff).
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// An error occurred in the invoice aggregate.
    #[error("Invoice error: {0}")]
    Invoice(InvoiceError),

    /// An error occurred in the payment aggregate.
    #[error("Payment error: {0}")]
    Payment(PaymentError),

    /// A monetary arithmetic error.
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Aggregate not found.
    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    /// A loaded event did not belong to the requested tenant.
    #[error("Tenant mismatch: requested {requested}, found {found}")]
    TenantMismatch {
        requested: TenantId,
        found: TenantId,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if the command can be retried after reloading the
    /// aggregate (the append lost an optimistic-concurrency race).
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. })
        )
    }
}
