//! Settlement error types.

use common::AggregateId;
use domain::{DomainError, Money, PaymentStatus};
use thiserror::Error;

/// Errors that can occur while settling a payment against its invoice.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The payment does not exist under this tenant.
    #[error("Payment not found: {0}")]
    PaymentNotFound(AggregateId),

    /// The invoice the payment references does not exist under this tenant.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(AggregateId),

    /// The payment has already failed and cannot be settled.
    #[error("Payment {payment_id} is {status} and cannot be settled")]
    PaymentNotSettleable {
        payment_id: AggregateId,
        status: PaymentStatus,
    },

    /// The invoice cannot accept the payment (wrong status or the amount
    /// exceeds the remaining balance). Checked before the payment is
    /// completed, so the payment stays Pending.
    #[error("Invoice {invoice_id} cannot accept a payment of {amount} (balance {balance})")]
    InvoiceCannotAccept {
        invoice_id: AggregateId,
        amount: Money,
        balance: Money,
    },

    /// The invoice-side append kept losing optimistic-concurrency races.
    #[error("Recording payment on invoice {invoice_id} failed after {attempts} attempts")]
    RetriesExhausted {
        invoice_id: AggregateId,
        attempts: u32,
    },

    /// An underlying domain or store error.
    #[error(transparent)]
    Domain(#[from] DomainError),
}
