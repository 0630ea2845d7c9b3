//! Invoice aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;
mod state;
mod value_objects;

pub use aggregate::Invoice;
pub use commands::*;
pub use events::{
    InvoiceApprovedData, InvoiceCancelledData, InvoiceCreatedData, InvoiceEvent,
    InvoiceFullyPaidData, InvoiceLineItemAddedData, InvoiceLineItemRemovedData,
    InvoicePaymentRecordedData,
};
pub use service::InvoiceService;
pub use state::InvoiceStatus;
pub use value_objects::{CustomerId, LineItem, VendorId};

use thiserror::Error;

use crate::money::{Money, MoneyError};

/// Errors that can occur during invoice operations.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Invoice is already created.
    #[error("Invoice already created")]
    AlreadyCreated,

    /// Invoice is not in the expected status.
    #[error("Invalid status transition: cannot {action} an invoice in {current_status} status")]
    InvalidStateTransition {
        current_status: InvoiceStatus,
        action: &'static str,
    },

    /// Line items are locked once the invoice leaves Draft.
    #[error("Cannot modify line items of an invoice in {current_status} status")]
    CannotModifyApprovedInvoice { current_status: InvoiceStatus },

    /// Approval requires at least one line item.
    #[error("Cannot approve an invoice with no line items")]
    CannotApproveEmptyInvoice,

    /// The payment would push paid beyond the grand total.
    #[error("Payment of {payment_amount} exceeds the remaining balance of {remaining}")]
    Overpayment {
        payment_amount: Money,
        remaining: Money,
    },

    /// Payments must be strictly positive.
    #[error("Invalid payment amount: {amount} (must be greater than zero)")]
    InvalidPaymentAmount { amount: Money },

    /// No line item at the given position.
    #[error("Line item not found at index {index}")]
    LineItemNotFound { index: usize },

    /// Quantities must be positive.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Line item descriptions are required.
    #[error("Line item description is required")]
    EmptyDescription,

    /// Cancellation requires a reason.
    #[error("Cancellation reason is required")]
    ReasonRequired,

    /// A monetary arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}
