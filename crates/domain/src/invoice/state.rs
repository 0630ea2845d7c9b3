//! Invoice state machine.

use serde::{Deserialize, Serialize};

/// The status of an invoice in its lifecycle.
///
/// Status transitions:
/// ```text
/// Draft ──► Approved ──► Paid
///   │           │
///   └───────────┴──► Cancelled
/// ```
///
/// Paid and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InvoiceStatus {
    /// Invoice is being drafted; line items can be added/removed.
    #[default]
    Draft,

    /// Invoice has been approved and assigned a Mushak number; line items
    /// are locked and payments can be recorded.
    Approved,

    /// The full grand total has been paid (terminal state).
    Paid,

    /// Invoice was cancelled with a reason (terminal state).
    Cancelled,
}

impl InvoiceStatus {
    /// Returns true if line items can be modified in this status.
    pub fn can_modify_line_items(&self) -> bool {
        matches!(self, InvoiceStatus::Draft)
    }

    /// Returns true if the invoice can be approved from this status.
    pub fn can_approve(&self) -> bool {
        matches!(self, InvoiceStatus::Draft)
    }

    /// Returns true if payments can be recorded in this status.
    pub fn can_record_payment(&self) -> bool {
        matches!(self, InvoiceStatus::Approved)
    }

    /// Returns true if the invoice can be cancelled from this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, InvoiceStatus::Draft | InvoiceStatus::Approved)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Approved => "Approved",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
