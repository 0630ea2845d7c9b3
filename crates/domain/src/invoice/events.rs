//! Invoice domain events.

use chrono::{DateTime, NaiveDate, Utc};
use common::{AggregateId, TenantId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::money::Money;
use crate::tax::TaxBreakdown;

use super::{CustomerId, LineItem, VendorId};

/// Events that can occur on an invoice aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InvoiceEvent {
    /// Invoice was created in Draft.
    InvoiceCreated(InvoiceCreatedData),

    /// A line item was added while in Draft.
    InvoiceLineItemAdded(InvoiceLineItemAddedData),

    /// A line item was removed while in Draft.
    InvoiceLineItemRemoved(InvoiceLineItemRemovedData),

    /// Invoice was approved and assigned a Mushak-6.3 number.
    InvoiceApproved(InvoiceApprovedData),

    /// A completed payment was recorded against the invoice.
    InvoicePaymentRecorded(InvoicePaymentRecordedData),

    /// The recorded payments reached the grand total.
    InvoiceFullyPaid(InvoiceFullyPaidData),

    /// Invoice was cancelled.
    InvoiceCancelled(InvoiceCancelledData),
}

impl DomainEvent for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::InvoiceCreated(_) => "InvoiceCreated",
            InvoiceEvent::InvoiceLineItemAdded(_) => "InvoiceLineItemAdded",
            InvoiceEvent::InvoiceLineItemRemoved(_) => "InvoiceLineItemRemoved",
            InvoiceEvent::InvoiceApproved(_) => "InvoiceApproved",
            InvoiceEvent::InvoicePaymentRecorded(_) => "InvoicePaymentRecorded",
            InvoiceEvent::InvoiceFullyPaid(_) => "InvoiceFullyPaid",
            InvoiceEvent::InvoiceCancelled(_) => "InvoiceCancelled",
        }
    }
}

/// Data for InvoiceCreated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceCreatedData {
    /// The unique invoice ID.
    pub invoice_id: AggregateId,

    /// The tenant that owns the invoice.
    pub tenant_id: TenantId,

    /// The customer being billed.
    pub customer_id: CustomerId,

    /// The vendor issuing the invoice.
    pub vendor_id: VendorId,

    /// Invoice date.
    pub invoice_date: NaiveDate,

    /// Payment due date.
    pub due_date: NaiveDate,

    /// Initial line items (possibly empty while in Draft).
    pub line_items: Vec<LineItem>,

    /// Totals computed from the line items at creation.
    pub totals: TaxBreakdown,

    /// Bangladesh fiscal year derived from the invoice date.
    pub fiscal_year: String,

    /// Who created the invoice.
    pub created_by: UserId,

    /// When the invoice was created.
    pub created_at: DateTime<Utc>,
}

/// Data for InvoiceLineItemAdded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLineItemAddedData {
    /// The line item that was added.
    pub line_item: LineItem,

    /// Totals recomputed after the addition.
    pub totals: TaxBreakdown,
}

/// Data for InvoiceLineItemRemoved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLineItemRemovedData {
    /// Position of the removed line item.
    pub index: usize,

    /// Totals recomputed after the removal.
    pub totals: TaxBreakdown,
}

/// Data for InvoiceApproved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceApprovedData {
    /// The Mushak-6.3 number issued at approval.
    pub mushak_number: String,

    /// Who approved the invoice.
    pub approved_by: UserId,

    /// When the invoice was approved.
    pub approved_at: DateTime<Utc>,
}

/// Data for InvoicePaymentRecorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicePaymentRecordedData {
    /// The payment that was recorded.
    pub payment_id: AggregateId,

    /// Amount of this payment.
    pub payment_amount: Money,

    /// Total paid after this payment.
    pub new_paid_amount: Money,

    /// Remaining balance after this payment.
    pub remaining_amount: Money,

    /// When the payment was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Data for InvoiceFullyPaid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceFullyPaidData {
    /// When the final payment landed.
    pub paid_at: DateTime<Utc>,
}

/// Data for InvoiceCancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceCancelledData {
    /// Reason for cancellation (required).
    pub reason: String,

    /// Who cancelled the invoice.
    pub cancelled_by: UserId,

    /// When the invoice was cancelled.
    pub cancelled_at: DateTime<Utc>,
}

// Convenience constructors for events
impl InvoiceEvent {
    /// Creates an InvoiceCreated event.
    #[allow(clippy::too_many_arguments)]
    pub fn created(
        invoice_id: AggregateId,
        tenant_id: TenantId,
        customer_id: CustomerId,
        vendor_id: VendorId,
        invoice_date: NaiveDate,
        due_date: NaiveDate,
        line_items: Vec<LineItem>,
        totals: TaxBreakdown,
        fiscal_year: String,
        created_by: UserId,
    ) -> Self {
        InvoiceEvent::InvoiceCreated(InvoiceCreatedData {
            invoice_id,
            tenant_id,
            customer_id,
            vendor_id,
            invoice_date,
            due_date,
            line_items,
            totals,
            fiscal_year,
            created_by,
            created_at: Utc::now(),
        })
    }

    /// Creates an InvoiceLineItemAdded event.
    pub fn line_item_added(line_item: LineItem, totals: TaxBreakdown) -> Self {
        InvoiceEvent::InvoiceLineItemAdded(InvoiceLineItemAddedData { line_item, totals })
    }

    /// Creates an InvoiceLineItemRemoved event.
    pub fn line_item_removed(index: usize, totals: TaxBreakdown) -> Self {
        InvoiceEvent::InvoiceLineItemRemoved(InvoiceLineItemRemovedData { index, totals })
    }

    /// Creates an InvoiceApproved event.
    pub fn approved(mushak_number: impl Into<String>, approved_by: UserId) -> Self {
        InvoiceEvent::InvoiceApproved(InvoiceApprovedData {
            mushak_number: mushak_number.into(),
            approved_by,
            approved_at: Utc::now(),
        })
    }

    /// Creates an InvoicePaymentRecorded event.
    pub fn payment_recorded(
        payment_id: AggregateId,
        payment_amount: Money,
        new_paid_amount: Money,
        remaining_amount: Money,
    ) -> Self {
        InvoiceEvent::InvoicePaymentRecorded(InvoicePaymentRecordedData {
            payment_id,
            payment_amount,
            new_paid_amount,
            remaining_amount,
            recorded_at: Utc::now(),
        })
    }

    /// Creates an InvoiceFullyPaid event.
    pub fn fully_paid() -> Self {
        InvoiceEvent::InvoiceFullyPaid(InvoiceFullyPaidData { paid_at: Utc::now() })
    }

    /// Creates an InvoiceCancelled event.
    pub fn cancelled(reason: impl Into<String>, cancelled_by: UserId) -> Self {
        InvoiceEvent::InvoiceCancelled(InvoiceCancelledData {
            reason: reason.into(),
            cancelled_by,
            cancelled_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;
    use crate::tax::{TaxBreakdown, VatCategory};

    fn totals() -> TaxBreakdown {
        TaxBreakdown::zero(Currency::Bdt)
    }

    #[test]
    fn event_types() {
        let event = InvoiceEvent::approved("MUS-6.3-2025-2026-0000ABCD", UserId::new());
        assert_eq!(event.event_type(), "InvoiceApproved");

        let event = InvoiceEvent::fully_paid();
        assert_eq!(event.event_type(), "InvoiceFullyPaid");

        let event = InvoiceEvent::cancelled("duplicate", UserId::new());
        assert_eq!(event.event_type(), "InvoiceCancelled");

        let item = LineItem::new(
            "Bricks",
            100,
            Money::bdt(1_500).unwrap(),
            VatCategory::Standard,
        );
        let event = InvoiceEvent::line_item_added(item, totals());
        assert_eq!(event.event_type(), "InvoiceLineItemAdded");

        let event = InvoiceEvent::line_item_removed(0, totals());
        assert_eq!(event.event_type(), "InvoiceLineItemRemoved");
    }

    #[test]
    fn created_event_serialization() {
        let invoice_id = AggregateId::new();
        let tenant_id = TenantId::new();
        let event = InvoiceEvent::created(
            invoice_id,
            tenant_id,
            CustomerId::new(),
            VendorId::new(),
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            vec![],
            totals(),
            "2025-2026".to_string(),
            UserId::new(),
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("InvoiceCreated"));

        let deserialized: InvoiceEvent = serde_json::from_str(&json).unwrap();
        if let InvoiceEvent::InvoiceCreated(data) = deserialized {
            assert_eq!(data.invoice_id, invoice_id);
            assert_eq!(data.tenant_id, tenant_id);
            assert_eq!(data.fiscal_year, "2025-2026");
        } else {
            panic!("Expected InvoiceCreated event");
        }
    }

    #[test]
    fn payment_recorded_serialization() {
        let payment_id = AggregateId::new();
        let event = InvoiceEvent::payment_recorded(
            payment_id,
            Money::bdt(800_000).unwrap(),
            Money::bdt(800_000).unwrap(),
            Money::bdt(350_000).unwrap(),
        );

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: InvoiceEvent = serde_json::from_str(&json).unwrap();

        if let InvoiceEvent::InvoicePaymentRecorded(data) = deserialized {
            assert_eq!(data.payment_id, payment_id);
            assert_eq!(data.payment_amount.minor(), 800_000);
            assert_eq!(data.remaining_amount.minor(), 350_000);
        } else {
            panic!("Expected InvoicePaymentRecorded event");
        }
    }
}
