//! Invoice aggregate implementation.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use common::{AggregateId, TenantId, UserId};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::money::{Currency, Money};
use crate::tax::{self, TaxCalculator};

use super::{
    CreateInvoice, CustomerId, InvoiceError, InvoiceEvent, InvoiceStatus, LineItem, VendorId,
    events::{
        InvoiceApprovedData, InvoiceCancelledData, InvoiceCreatedData, InvoiceFullyPaidData,
        InvoiceLineItemAddedData, InvoiceLineItemRemovedData, InvoicePaymentRecordedData,
    },
};

/// Invoice aggregate root.
///
/// Owns the Draft -> Approved -> Paid / Cancelled lifecycle, the derived
/// VAT totals, and the overpayment guard: it alone knows the remaining
/// balance, so it alone decides whether a payment may be recorded.
///
/// `mushak_number` is Some exactly when the invoice has been approved;
/// `paid_at` is Some exactly when it is Paid. Both are post-conditions of
/// their transitions and covered by tests below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique invoice identifier.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// Tenant that owns this invoice.
    tenant_id: Option<TenantId>,

    /// Customer being billed.
    customer_id: Option<CustomerId>,

    /// Vendor issuing the invoice.
    vendor_id: Option<VendorId>,

    /// Invoice date.
    invoice_date: Option<NaiveDate>,

    /// Payment due date.
    due_date: Option<NaiveDate>,

    /// Ordered line items; locked once the invoice leaves Draft.
    line_items: Vec<LineItem>,

    /// Current lifecycle status.
    status: InvoiceStatus,

    /// Sum of line amounts before tax.
    subtotal: Money,

    /// VAT across all line items.
    vat_amount: Money,

    /// Supplementary duty, zero unless configured.
    supplementary_duty: Money,

    /// subtotal + VAT + supplementary duty.
    grand_total: Money,

    /// Total recorded payments; never exceeds `grand_total`.
    paid_amount: Money,

    /// Mushak-6.3 number, assigned on approval.
    mushak_number: Option<String>,

    /// When the invoice reached Paid.
    paid_at: Option<DateTime<Utc>>,

    /// Why the invoice was cancelled.
    cancellation_reason: Option<String>,

    /// Bangladesh fiscal year of the invoice date.
    fiscal_year: Option<String>,

    /// Payments already recorded, for idempotent redelivery.
    recorded_payments: HashSet<AggregateId>,
}

impl Aggregate for Invoice {
    type Event = InvoiceEvent;
    type Error = InvoiceError;

    fn aggregate_type() -> &'static str {
        "Invoice"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            InvoiceEvent::InvoiceCreated(data) => self.apply_created(data),
            InvoiceEvent::InvoiceLineItemAdded(data) => self.apply_line_item_added(data),
            InvoiceEvent::InvoiceLineItemRemoved(data) => self.apply_line_item_removed(data),
            InvoiceEvent::InvoiceApproved(data) => self.apply_approved(data),
            InvoiceEvent::InvoicePaymentRecorded(data) => self.apply_payment_recorded(data),
            InvoiceEvent::InvoiceFullyPaid(data) => self.apply_fully_paid(data),
            InvoiceEvent::InvoiceCancelled(data) => self.apply_cancelled(data),
        }
    }
}

impl SnapshotCapable for Invoice {
    fn snapshot_interval() -> usize {
        50
    }
}

// Query methods
impl Invoice {
    /// Returns the customer ID.
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Returns the vendor ID.
    pub fn vendor_id(&self) -> Option<VendorId> {
        self.vendor_id
    }

    /// Returns the invoice date.
    pub fn invoice_date(&self) -> Option<NaiveDate> {
        self.invoice_date
    }

    /// Returns the due date.
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Returns the current status.
    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    /// Returns the line items in order.
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Returns the number of line items.
    pub fn line_item_count(&self) -> usize {
        self.line_items.len()
    }

    /// Returns the subtotal before tax.
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// Returns the VAT amount.
    pub fn vat_amount(&self) -> Money {
        self.vat_amount
    }

    /// Returns the supplementary duty.
    pub fn supplementary_duty(&self) -> Money {
        self.supplementary_duty
    }

    /// Returns the grand total.
    pub fn grand_total(&self) -> Money {
        self.grand_total
    }

    /// Returns the total recorded payments.
    pub fn paid_amount(&self) -> Money {
        self.paid_amount
    }

    /// Returns the remaining balance (grand total minus paid).
    pub fn balance(&self) -> Money {
        self.grand_total
            .subtract(self.paid_amount)
            .unwrap_or_else(|_| Money::zero(self.currency()))
    }

    /// Returns the invoice currency.
    pub fn currency(&self) -> Currency {
        self.grand_total.currency()
    }

    /// Returns the Mushak-6.3 number, Some once approved.
    pub fn mushak_number(&self) -> Option<&str> {
        self.mushak_number.as_deref()
    }

    /// Returns when the invoice was fully paid, Some once Paid.
    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// Returns the cancellation reason, Some once Cancelled.
    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    /// Returns the fiscal year of the invoice date.
    pub fn fiscal_year(&self) -> Option<&str> {
        self.fiscal_year.as_deref()
    }

    /// Returns true if this payment has already been recorded.
    pub fn has_recorded_payment(&self, payment_id: AggregateId) -> bool {
        self.recorded_payments.contains(&payment_id)
    }

    /// Returns true if the invoice is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns true if the invoice could accept a payment of `amount`.
    pub fn can_accept_payment(&self, amount: Money) -> bool {
        if !self.status.can_record_payment() || !amount.is_positive() {
            return false;
        }
        match self.paid_amount.add(amount) {
            Ok(new_paid) => !new_paid
                .is_greater_than(self.grand_total)
                .unwrap_or(true),
            Err(_) => false,
        }
    }

    fn validate_line_item(item: &LineItem) -> Result<(), InvoiceError> {
        if item.quantity == 0 {
            return Err(InvoiceError::InvalidQuantity {
                quantity: item.quantity,
            });
        }
        if item.description.trim().is_empty() {
            return Err(InvoiceError::EmptyDescription);
        }
        Ok(())
    }
}

// Command methods (return events)
impl Invoice {
    /// Creates a new invoice in Draft.
    ///
    /// Line items may be empty while drafting; totals are computed through
    /// the tax calculator and carried on the event.
    pub fn create(
        &self,
        cmd: &CreateInvoice,
        calculator: &TaxCalculator,
    ) -> Result<Vec<InvoiceEvent>, InvoiceError> {
        if self.id.is_some() {
            return Err(InvoiceError::AlreadyCreated);
        }

        for item in &cmd.line_items {
            Self::validate_line_item(item)?;
        }

        let currency = cmd
            .line_items
            .first()
            .map(|item| item.unit_price.currency())
            .unwrap_or_default();
        let totals = calculator.calculate(&cmd.line_items, currency)?;
        let fiscal_year = tax::fiscal_year(cmd.invoice_date);

        Ok(vec![InvoiceEvent::created(
            cmd.invoice_id,
            cmd.tenant_id,
            cmd.customer_id,
            cmd.vendor_id,
            cmd.invoice_date,
            cmd.due_date,
            cmd.line_items.clone(),
            totals,
            fiscal_year,
            cmd.created_by,
        )])
    }

    /// Adds a line item to a Draft invoice, recomputing totals.
    pub fn add_line_item(
        &self,
        item: LineItem,
        calculator: &TaxCalculator,
    ) -> Result<Vec<InvoiceEvent>, InvoiceError> {
        if !self.status.can_modify_line_items() {
            return Err(InvoiceError::CannotModifyApprovedInvoice {
                current_status: self.status,
            });
        }

        Self::validate_line_item(&item)?;

        let currency = if self.line_items.is_empty() {
            item.unit_price.currency()
        } else {
            self.currency()
        };
        let mut items = self.line_items.clone();
        items.push(item.clone());
        let totals = calculator.calculate(&items, currency)?;

        Ok(vec![InvoiceEvent::line_item_added(item, totals)])
    }

    /// Removes the line item at `index` from a Draft invoice.
    pub fn remove_line_item(
        &self,
        index: usize,
        calculator: &TaxCalculator,
    ) -> Result<Vec<InvoiceEvent>, InvoiceError> {
        if !self.status.can_modify_line_items() {
            return Err(InvoiceError::CannotModifyApprovedInvoice {
                current_status: self.status,
            });
        }

        if index >= self.line_items.len() {
            return Err(InvoiceError::LineItemNotFound { index });
        }

        let mut items = self.line_items.clone();
        items.remove(index);
        let totals = calculator.calculate(&items, self.currency())?;

        Ok(vec![InvoiceEvent::line_item_removed(index, totals)])
    }

    /// Approves the invoice, issuing its Mushak-6.3 number.
    ///
    /// A no-op on an already-approved invoice; rejected with
    /// `CannotApproveEmptyInvoice` when there are no line items.
    pub fn approve(&self, approved_by: UserId) -> Result<Vec<InvoiceEvent>, InvoiceError> {
        if self.status == InvoiceStatus::Approved {
            return Ok(vec![]);
        }

        if !self.status.can_approve() {
            return Err(InvoiceError::InvalidStateTransition {
                current_status: self.status,
                action: "approve",
            });
        }

        if self.line_items.is_empty() {
            return Err(InvoiceError::CannotApproveEmptyInvoice);
        }

        let fiscal_year = self.fiscal_year.as_deref().unwrap_or("0000-0000");
        let mushak_number = tax::mushak_number(fiscal_year);

        Ok(vec![InvoiceEvent::approved(mushak_number, approved_by)])
    }

    /// Records a completed payment against the invoice.
    ///
    /// Returns `InvoicePaymentRecorded`, plus `InvoiceFullyPaid` in the
    /// same batch when the payment settles the balance; the handler appends
    /// both with one expected version, so no intermediate state where
    /// `paid_amount == grand_total` but status is not Paid is observable.
    ///
    /// Recording the same `payment_id` twice is a no-op.
    pub fn record_payment(
        &self,
        payment_id: AggregateId,
        amount: Money,
    ) -> Result<Vec<InvoiceEvent>, InvoiceError> {
        if self.recorded_payments.contains(&payment_id) {
            return Ok(vec![]);
        }

        if !self.status.can_record_payment() {
            return Err(InvoiceError::InvalidStateTransition {
                current_status: self.status,
                action: "record a payment against",
            });
        }

        if !amount.is_positive() {
            return Err(InvoiceError::InvalidPaymentAmount { amount });
        }

        let new_paid_amount = self.paid_amount.add(amount)?;
        if new_paid_amount.is_greater_than(self.grand_total)? {
            return Err(InvoiceError::Overpayment {
                payment_amount: amount,
                remaining: self.grand_total.subtract(self.paid_amount)?,
            });
        }

        let remaining_amount = self.grand_total.subtract(new_paid_amount)?;

        let mut events = vec![InvoiceEvent::payment_recorded(
            payment_id,
            amount,
            new_paid_amount,
            remaining_amount,
        )];

        if remaining_amount.is_zero() {
            events.push(InvoiceEvent::fully_paid());
        }

        Ok(events)
    }

    /// Cancels the invoice with a required reason.
    ///
    /// A no-op on an already-cancelled invoice; rejected once Paid.
    pub fn cancel(
        &self,
        reason: impl Into<String>,
        cancelled_by: UserId,
    ) -> Result<Vec<InvoiceEvent>, InvoiceError> {
        if self.status == InvoiceStatus::Cancelled {
            return Ok(vec![]);
        }

        if !self.status.can_cancel() {
            return Err(InvoiceError::InvalidStateTransition {
                current_status: self.status,
                action: "cancel",
            });
        }

        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(InvoiceError::ReasonRequired);
        }

        Ok(vec![InvoiceEvent::cancelled(reason, cancelled_by)])
    }
}

// Apply event helpers
impl Invoice {
    fn apply_created(&mut self, data: InvoiceCreatedData) {
        self.id = Some(data.invoice_id);
        self.tenant_id = Some(data.tenant_id);
        self.customer_id = Some(data.customer_id);
        self.vendor_id = Some(data.vendor_id);
        self.invoice_date = Some(data.invoice_date);
        self.due_date = Some(data.due_date);
        self.line_items = data.line_items;
        self.status = InvoiceStatus::Draft;
        self.apply_totals(data.totals);
        self.paid_amount = Money::zero(data.totals.grand_total.currency());
        self.fiscal_year = Some(data.fiscal_year);
    }

    fn apply_line_item_added(&mut self, data: InvoiceLineItemAddedData) {
        self.line_items.push(data.line_item);
        self.apply_totals(data.totals);
    }

    fn apply_line_item_removed(&mut self, data: InvoiceLineItemRemovedData) {
        if data.index < self.line_items.len() {
            self.line_items.remove(data.index);
        }
        self.apply_totals(data.totals);
    }

    fn apply_approved(&mut self, data: InvoiceApprovedData) {
        self.status = InvoiceStatus::Approved;
        self.mushak_number = Some(data.mushak_number);
    }

    fn apply_payment_recorded(&mut self, data: InvoicePaymentRecordedData) {
        self.paid_amount = data.new_paid_amount;
        self.recorded_payments.insert(data.payment_id);
    }

    fn apply_fully_paid(&mut self, data: InvoiceFullyPaidData) {
        self.status = InvoiceStatus::Paid;
        self.paid_at = Some(data.paid_at);
    }

    fn apply_cancelled(&mut self, data: InvoiceCancelledData) {
        self.status = InvoiceStatus::Cancelled;
        self.cancellation_reason = Some(data.reason);
    }

    fn apply_totals(&mut self, totals: crate::tax::TaxBreakdown) {
        self.subtotal = totals.subtotal;
        self.vat_amount = totals.vat_amount;
        self.supplementary_duty = totals.supplementary_duty;
        self.grand_total = totals.grand_total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DomainEvent;
    use crate::tax::VatCategory;

    fn calculator() -> TaxCalculator {
        TaxCalculator::new()
    }

    fn standard_item(quantity: u32, unit_price_minor: i64) -> LineItem {
        LineItem::new(
            "Construction materials",
            quantity,
            Money::bdt(unit_price_minor).unwrap(),
            VatCategory::Standard,
        )
    }

    fn create_cmd(line_items: Vec<LineItem>) -> CreateInvoice {
        CreateInvoice {
            invoice_id: AggregateId::new(),
            tenant_id: TenantId::new(),
            customer_id: CustomerId::new(),
            vendor_id: VendorId::new(),
            invoice_date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            line_items,
            created_by: UserId::new(),
        }
    }

    fn create_invoice(line_items: Vec<LineItem>) -> Invoice {
        let mut invoice = Invoice::default();
        let events = invoice.create(&create_cmd(line_items), &calculator()).unwrap();
        invoice.apply_events(events);
        invoice
    }

    fn approved_invoice(line_items: Vec<LineItem>) -> Invoice {
        let mut invoice = create_invoice(line_items);
        let events = invoice.approve(UserId::new()).unwrap();
        invoice.apply_events(events);
        invoice
    }

    #[test]
    fn create_computes_vat_totals() {
        // qty=100 x 100.00 BDT standard VAT -> 10000 / 1500 / 11500
        let invoice = create_invoice(vec![standard_item(100, 10_000)]);

        assert_eq!(invoice.status(), InvoiceStatus::Draft);
        assert_eq!(invoice.subtotal().minor(), 1_000_000);
        assert_eq!(invoice.vat_amount().minor(), 150_000);
        assert_eq!(invoice.grand_total().minor(), 1_150_000);
        assert!(invoice.paid_amount().is_zero());
        assert_eq!(invoice.fiscal_year(), Some("2025-2026"));
        assert!(invoice.mushak_number().is_none());
    }

    #[test]
    fn create_twice_fails() {
        let invoice = create_invoice(vec![standard_item(1, 1_000)]);
        let result = invoice.create(&create_cmd(vec![]), &calculator());
        assert!(matches!(result, Err(InvoiceError::AlreadyCreated)));
    }

    #[test]
    fn create_with_empty_line_items_is_allowed_in_draft() {
        let invoice = create_invoice(vec![]);
        assert_eq!(invoice.line_item_count(), 0);
        assert!(invoice.grand_total().is_zero());
    }

    #[test]
    fn create_rejects_zero_quantity() {
        let invoice = Invoice::default();
        let result = invoice.create(
            &create_cmd(vec![standard_item(0, 1_000)]),
            &calculator(),
        );
        assert!(matches!(
            result,
            Err(InvoiceError::InvalidQuantity { quantity: 0 })
        ));
    }

    #[test]
    fn fractional_pricing_rounds_half_up_at_vat_computation() {
        // qty=3 x 333.33 -> subtotal 999.99, VAT 150.00, total 1149.99
        let invoice = create_invoice(vec![standard_item(3, 33_333)]);

        assert_eq!(invoice.subtotal().minor(), 99_999);
        assert_eq!(invoice.vat_amount().minor(), 15_000);
        assert_eq!(invoice.grand_total().minor(), 114_999);
    }

    #[test]
    fn add_line_item_recomputes_totals() {
        let mut invoice = create_invoice(vec![standard_item(1, 10_000)]);

        let events = invoice
            .add_line_item(standard_item(2, 5_000), &calculator())
            .unwrap();
        invoice.apply_events(events);

        assert_eq!(invoice.line_item_count(), 2);
        assert_eq!(invoice.subtotal().minor(), 20_000);
        assert_eq!(invoice.vat_amount().minor(), 3_000);
        assert_eq!(invoice.grand_total().minor(), 23_000);
    }

    #[test]
    fn remove_line_item_recomputes_totals() {
        let mut invoice = create_invoice(vec![standard_item(1, 10_000), standard_item(2, 5_000)]);

        let events = invoice.remove_line_item(1, &calculator()).unwrap();
        invoice.apply_events(events);

        assert_eq!(invoice.line_item_count(), 1);
        assert_eq!(invoice.subtotal().minor(), 10_000);
        assert_eq!(invoice.grand_total().minor(), 11_500);
    }

    #[test]
    fn remove_line_item_out_of_bounds_fails() {
        let invoice = create_invoice(vec![standard_item(1, 10_000)]);
        let result = invoice.remove_line_item(5, &calculator());
        assert!(matches!(
            result,
            Err(InvoiceError::LineItemNotFound { index: 5 })
        ));
    }

    #[test]
    fn line_items_are_locked_after_approval() {
        let invoice = approved_invoice(vec![standard_item(1, 10_000)]);

        let result = invoice.add_line_item(standard_item(1, 5_000), &calculator());
        assert!(matches!(
            result,
            Err(InvoiceError::CannotModifyApprovedInvoice { .. })
        ));

        let result = invoice.remove_line_item(0, &calculator());
        assert!(matches!(
            result,
            Err(InvoiceError::CannotModifyApprovedInvoice { .. })
        ));
    }

    #[test]
    fn approve_assigns_mushak_number() {
        let invoice = approved_invoice(vec![standard_item(1, 10_000)]);

        assert_eq!(invoice.status(), InvoiceStatus::Approved);
        let mushak = invoice.mushak_number().unwrap();
        assert!(mushak.starts_with("MUS-6.3-2025-2026-"));
    }

    #[test]
    fn approve_twice_is_a_no_op() {
        let invoice = approved_invoice(vec![standard_item(1, 10_000)]);

        let events = invoice.approve(UserId::new()).unwrap();
        assert!(events.is_empty());
        assert_eq!(invoice.status(), InvoiceStatus::Approved);
    }

    #[test]
    fn approve_empty_invoice_fails_without_events() {
        let invoice = create_invoice(vec![]);

        let result = invoice.approve(UserId::new());
        assert!(matches!(result, Err(InvoiceError::CannotApproveEmptyInvoice)));
        assert_eq!(invoice.status(), InvoiceStatus::Draft);
    }

    #[test]
    fn approve_cancelled_invoice_fails() {
        let mut invoice = create_invoice(vec![standard_item(1, 10_000)]);
        invoice.apply_events(invoice.cancel("duplicate entry", UserId::new()).unwrap());

        let result = invoice.approve(UserId::new());
        assert!(matches!(
            result,
            Err(InvoiceError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn full_payment_marks_paid_with_both_events_in_one_batch() {
        // Scenario A: 100 x 100.00 -> grand total 11500.00, one payment
        let mut invoice = approved_invoice(vec![standard_item(100, 10_000)]);

        let events = invoice
            .record_payment(AggregateId::new(), Money::bdt(1_150_000).unwrap())
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), "InvoicePaymentRecorded");
        assert_eq!(events[1].event_type(), "InvoiceFullyPaid");

        invoice.apply_events(events);
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        assert_eq!(invoice.paid_amount().minor(), 1_150_000);
        assert!(invoice.balance().is_zero());
        assert!(invoice.paid_at().is_some());
    }

    #[test]
    fn overpayment_is_rejected_and_state_unchanged() {
        // Scenario B: pay 8000 then attempt 5000 against 11500 total
        let mut invoice = approved_invoice(vec![standard_item(100, 10_000)]);

        invoice.apply_events(
            invoice
                .record_payment(AggregateId::new(), Money::bdt(800_000).unwrap())
                .unwrap(),
        );
        assert_eq!(invoice.paid_amount().minor(), 800_000);

        let result = invoice.record_payment(AggregateId::new(), Money::bdt(500_000).unwrap());
        assert!(matches!(result, Err(InvoiceError::Overpayment { .. })));
        assert_eq!(invoice.paid_amount().minor(), 800_000);
        assert_eq!(invoice.status(), InvoiceStatus::Approved);
    }

    #[test]
    fn three_partial_payments_emit_one_fully_paid() {
        // Scenario C: 10000 + 14500 + 10000 against 34500
        let mut invoice = approved_invoice(vec![standard_item(300, 10_000)]);
        assert_eq!(invoice.grand_total().minor(), 3_450_000);

        let mut fully_paid_count = 0;
        for amount in [1_000_000_i64, 1_450_000, 1_000_000] {
            let events = invoice
                .record_payment(AggregateId::new(), Money::bdt(amount).unwrap())
                .unwrap();
            fully_paid_count += events
                .iter()
                .filter(|e| e.event_type() == "InvoiceFullyPaid")
                .count();
            invoice.apply_events(events);
        }

        assert_eq!(fully_paid_count, 1);
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        assert_eq!(invoice.paid_amount().minor(), 3_450_000);
        assert!(invoice.balance().is_zero());
    }

    #[test]
    fn duplicate_payment_id_is_a_no_op() {
        let mut invoice = approved_invoice(vec![standard_item(100, 10_000)]);
        let payment_id = AggregateId::new();

        invoice.apply_events(
            invoice
                .record_payment(payment_id, Money::bdt(800_000).unwrap())
                .unwrap(),
        );

        // Redelivery of the same payment must not double-apply.
        let events = invoice
            .record_payment(payment_id, Money::bdt(800_000).unwrap())
            .unwrap();
        assert!(events.is_empty());
        assert_eq!(invoice.paid_amount().minor(), 800_000);
    }

    #[test]
    fn payments_rejected_while_draft() {
        let invoice = create_invoice(vec![standard_item(1, 10_000)]);
        let result = invoice.record_payment(AggregateId::new(), Money::bdt(1_000).unwrap());
        assert!(matches!(
            result,
            Err(InvoiceError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn payments_rejected_after_cancellation() {
        let mut invoice = approved_invoice(vec![standard_item(1, 10_000)]);
        invoice.apply_events(invoice.cancel("contract voided", UserId::new()).unwrap());

        let result = invoice.record_payment(AggregateId::new(), Money::bdt(1_000).unwrap());
        assert!(matches!(
            result,
            Err(InvoiceError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn zero_payment_amount_is_rejected() {
        let invoice = approved_invoice(vec![standard_item(1, 10_000)]);
        let result = invoice.record_payment(AggregateId::new(), Money::zero(Currency::Bdt));
        assert!(matches!(
            result,
            Err(InvoiceError::InvalidPaymentAmount { .. })
        ));
    }

    #[test]
    fn cancel_requires_a_reason() {
        let invoice = create_invoice(vec![standard_item(1, 10_000)]);
        let result = invoice.cancel("  ", UserId::new());
        assert!(matches!(result, Err(InvoiceError::ReasonRequired)));
    }

    #[test]
    fn cancel_paid_invoice_fails() {
        let mut invoice = approved_invoice(vec![standard_item(1, 10_000)]);
        invoice.apply_events(
            invoice
                .record_payment(AggregateId::new(), Money::bdt(11_500).unwrap())
                .unwrap(),
        );
        assert_eq!(invoice.status(), InvoiceStatus::Paid);

        let result = invoice.cancel("too late", UserId::new());
        assert!(matches!(
            result,
            Err(InvoiceError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn cancel_twice_is_a_no_op() {
        let mut invoice = create_invoice(vec![standard_item(1, 10_000)]);
        invoice.apply_events(invoice.cancel("duplicate entry", UserId::new()).unwrap());

        let events = invoice.cancel("again", UserId::new()).unwrap();
        assert!(events.is_empty());
        assert_eq!(invoice.cancellation_reason(), Some("duplicate entry"));
    }

    #[test]
    fn paid_invariant_holds_through_lifecycle() {
        let mut invoice = approved_invoice(vec![standard_item(300, 10_000)]);

        for amount in [1_000_000_i64, 1_450_000, 1_000_000] {
            let events = invoice
                .record_payment(AggregateId::new(), Money::bdt(amount).unwrap())
                .unwrap();
            invoice.apply_events(events);

            // 0 <= paid <= grand_total at every reachable state
            assert!(!invoice
                .paid_amount()
                .is_greater_than(invoice.grand_total())
                .unwrap());
            // status == Paid iff paid == grand_total
            let settled = invoice.paid_amount() == invoice.grand_total();
            assert_eq!(invoice.status() == InvoiceStatus::Paid, settled);
        }
    }

    #[test]
    fn replay_reproduces_live_state() {
        let mut invoice = Invoice::default();
        let mut history = Vec::new();

        let events = invoice
            .create(&create_cmd(vec![standard_item(100, 10_000)]), &calculator())
            .unwrap();
        history.extend(events.clone());
        invoice.apply_events(events);

        let events = invoice.approve(UserId::new()).unwrap();
        history.extend(events.clone());
        invoice.apply_events(events);

        let events = invoice
            .record_payment(AggregateId::new(), Money::bdt(1_150_000).unwrap())
            .unwrap();
        history.extend(events.clone());
        invoice.apply_events(events);

        let mut replayed = Invoice::default();
        replayed.apply_events(history);

        assert_eq!(replayed.id(), invoice.id());
        assert_eq!(replayed.status(), invoice.status());
        assert_eq!(replayed.paid_amount(), invoice.paid_amount());
        assert_eq!(replayed.grand_total(), invoice.grand_total());
        assert_eq!(replayed.mushak_number(), invoice.mushak_number());
        assert_eq!(replayed.paid_at(), invoice.paid_at());
    }

    #[test]
    fn serialization_roundtrip() {
        let invoice = approved_invoice(vec![standard_item(100, 10_000)]);
        let json = serde_json::to_string(&invoice).unwrap();
        let deserialized: Invoice = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.id(), invoice.id());
        assert_eq!(deserialized.status(), invoice.status());
        assert_eq!(deserialized.grand_total(), invoice.grand_total());
    }
}
