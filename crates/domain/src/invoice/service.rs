//! Invoice service providing a simplified API for invoice operations.

use std::sync::Arc;

use common::{AggregateId, TenantId};
use event_store::{EventPublisher, EventStore};

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::tax::TaxCalculator;

use super::{
    AddLineItem, ApproveInvoice, CancelInvoice, CreateInvoice, Invoice, RecordInvoicePayment,
    RemoveLineItem,
};

impl From<super::InvoiceError> for DomainError {
    fn from(e: super::InvoiceError) -> Self {
        DomainError::Invoice(e)
    }
}

/// Service for managing invoices.
///
/// Wraps the command handler with one method per inbound command. The tax
/// calculator is fixed at construction, so every totals computation in the
/// aggregate uses the same rate configuration.
pub struct InvoiceService<S: EventStore> {
    handler: CommandHandler<S, Invoice>,
    calculator: TaxCalculator,
}

impl<S: EventStore> InvoiceService<S> {
    /// Creates a new invoice service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
            calculator: TaxCalculator::new(),
        }
    }

    /// Sets the publisher that receives events after each successful append.
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.handler = self.handler.with_publisher(publisher);
        self
    }

    /// Replaces the tax calculator (e.g. to levy supplementary duty).
    pub fn with_calculator(mut self, calculator: TaxCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Invoice> {
        &self.handler
    }

    /// Creates a new invoice.
    #[tracing::instrument(skip(self, cmd), fields(invoice_id = %cmd.invoice_id, tenant_id = %cmd.tenant_id))]
    pub async fn create_invoice(
        &self,
        cmd: CreateInvoice,
    ) -> Result<CommandResult<Invoice>, DomainError> {
        let calculator = self.calculator;
        self.handler
            .execute(cmd.tenant_id, cmd.invoice_id, |invoice| {
                invoice.create(&cmd, &calculator)
            })
            .await
    }

    /// Adds a line item to a Draft invoice.
    #[tracing::instrument(skip(self, cmd), fields(invoice_id = %cmd.invoice_id))]
    pub async fn add_line_item(
        &self,
        cmd: AddLineItem,
    ) -> Result<CommandResult<Invoice>, DomainError> {
        let calculator = self.calculator;
        let item = cmd.line_item.clone();

        self.handler
            .execute(cmd.tenant_id, cmd.invoice_id, |invoice| {
                invoice.add_line_item(item, &calculator)
            })
            .await
    }

    /// Removes a line item from a Draft invoice.
    #[tracing::instrument(skip(self, cmd), fields(invoice_id = %cmd.invoice_id))]
    pub async fn remove_line_item(
        &self,
        cmd: RemoveLineItem,
    ) -> Result<CommandResult<Invoice>, DomainError> {
        let calculator = self.calculator;

        self.handler
            .execute(cmd.tenant_id, cmd.invoice_id, |invoice| {
                invoice.remove_line_item(cmd.index, &calculator)
            })
            .await
    }

    /// Approves an invoice, issuing its Mushak-6.3 number.
    #[tracing::instrument(skip(self, cmd), fields(invoice_id = %cmd.invoice_id))]
    pub async fn approve_invoice(
        &self,
        cmd: ApproveInvoice,
    ) -> Result<CommandResult<Invoice>, DomainError> {
        self.handler
            .execute(cmd.tenant_id, cmd.invoice_id, |invoice| {
                invoice.approve(cmd.approved_by)
            })
            .await
    }

    /// Records a completed payment against an invoice.
    ///
    /// When the payment settles the balance, `InvoicePaymentRecorded` and
    /// `InvoiceFullyPaid` are appended in one atomic batch.
    #[tracing::instrument(skip(self, cmd), fields(invoice_id = %cmd.invoice_id, payment_id = %cmd.payment_id))]
    pub async fn record_payment(
        &self,
        cmd: RecordInvoicePayment,
    ) -> Result<CommandResult<Invoice>, DomainError> {
        self.handler
            .execute(cmd.tenant_id, cmd.invoice_id, |invoice| {
                invoice.record_payment(cmd.payment_id, cmd.amount)
            })
            .await
    }

    /// Cancels an invoice with a required reason.
    #[tracing::instrument(skip(self, cmd), fields(invoice_id = %cmd.invoice_id))]
    pub async fn cancel_invoice(
        &self,
        cmd: CancelInvoice,
    ) -> Result<CommandResult<Invoice>, DomainError> {
        let reason = cmd.reason.clone();

        self.handler
            .execute(cmd.tenant_id, cmd.invoice_id, |invoice| {
                invoice.cancel(reason, cmd.cancelled_by)
            })
            .await
    }

    /// Loads an invoice by ID, reading through its event stream.
    ///
    /// This is the strong read path: it reflects every committed event,
    /// unlike the eventually-consistent projections. Returns None if the
    /// invoice doesn't exist under this tenant.
    #[tracing::instrument(skip(self))]
    pub async fn get_invoice(
        &self,
        tenant_id: TenantId,
        invoice_id: AggregateId,
    ) -> Result<Option<Invoice>, DomainError> {
        self.handler.load_existing(tenant_id, invoice_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::invoice::{CustomerId, InvoiceStatus, LineItem, VendorId};
    use crate::money::Money;
    use crate::tax::VatCategory;
    use chrono::NaiveDate;
    use common::UserId;
    use event_store::{EventStoreError, InMemoryEventStore};

    fn service() -> InvoiceService<InMemoryEventStore> {
        InvoiceService::new(InMemoryEventStore::new())
    }

    fn standard_item(quantity: u32, unit_price_minor: i64) -> LineItem {
        LineItem::new(
            "Construction materials",
            quantity,
            Money::bdt(unit_price_minor).unwrap(),
            VatCategory::Standard,
        )
    }

    fn create_cmd(tenant_id: TenantId, line_items: Vec<LineItem>) -> CreateInvoice {
        CreateInvoice::new(
            tenant_id,
            CustomerId::new(),
            VendorId::new(),
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            line_items,
            UserId::new(),
        )
    }

    #[tokio::test]
    async fn create_invoice() {
        let service = service();
        let tenant_id = TenantId::new();
        let cmd = create_cmd(tenant_id, vec![standard_item(100, 10_000)]);
        let invoice_id = cmd.invoice_id;

        let result = service.create_invoice(cmd).await.unwrap();

        assert_eq!(result.aggregate.id(), Some(invoice_id));
        assert_eq!(result.aggregate.tenant_id(), Some(tenant_id));
        assert_eq!(result.aggregate.grand_total().minor(), 1_150_000);
        assert_eq!(result.events.len(), 1);
    }

    #[tokio::test]
    async fn full_lifecycle_to_paid() {
        let service = service();
        let tenant_id = TenantId::new();
        let cmd = create_cmd(tenant_id, vec![standard_item(100, 10_000)]);
        let invoice_id = cmd.invoice_id;
        service.create_invoice(cmd).await.unwrap();

        service
            .approve_invoice(ApproveInvoice::new(invoice_id, tenant_id, UserId::new()))
            .await
            .unwrap();

        let result = service
            .record_payment(RecordInvoicePayment::new(
                invoice_id,
                tenant_id,
                AggregateId::new(),
                Money::bdt(1_150_000).unwrap(),
            ))
            .await
            .unwrap();

        assert_eq!(result.aggregate.status(), InvoiceStatus::Paid);
        assert!(result.aggregate.balance().is_zero());
        assert_eq!(result.events.len(), 2);
    }

    #[tokio::test]
    async fn approve_twice_persists_one_event() {
        let service = service();
        let tenant_id = TenantId::new();
        let cmd = create_cmd(tenant_id, vec![standard_item(1, 10_000)]);
        let invoice_id = cmd.invoice_id;
        service.create_invoice(cmd).await.unwrap();

        let first = service
            .approve_invoice(ApproveInvoice::new(invoice_id, tenant_id, UserId::new()))
            .await
            .unwrap();
        assert_eq!(first.events.len(), 1);
        let version_after_first = first.new_version;

        let second = service
            .approve_invoice(ApproveInvoice::new(invoice_id, tenant_id, UserId::new()))
            .await
            .unwrap();
        assert!(second.events.is_empty());
        assert_eq!(second.new_version, version_after_first);
        assert_eq!(
            second.aggregate.mushak_number(),
            first.aggregate.mushak_number()
        );
    }

    #[tokio::test]
    async fn get_invoice_reads_through_the_stream() {
        let service = service();
        let tenant_id = TenantId::new();
        let cmd = create_cmd(tenant_id, vec![standard_item(1, 10_000)]);
        let invoice_id = cmd.invoice_id;

        assert!(service
            .get_invoice(tenant_id, invoice_id)
            .await
            .unwrap()
            .is_none());

        service.create_invoice(cmd).await.unwrap();

        let invoice = service
            .get_invoice(tenant_id, invoice_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.id(), Some(invoice_id));

        // Another tenant can never see it.
        assert!(service
            .get_invoice(TenantId::new(), invoice_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn concurrent_payments_cannot_both_exceed_total() {
        // Two racing record-payment commands against the same loaded
        // version: the first append wins, the second hits the optimistic
        // concurrency check.
        let service = service();
        let tenant_id = TenantId::new();
        let cmd = create_cmd(tenant_id, vec![standard_item(100, 10_000)]);
        let invoice_id = cmd.invoice_id;
        service.create_invoice(cmd).await.unwrap();
        service
            .approve_invoice(ApproveInvoice::new(invoice_id, tenant_id, UserId::new()))
            .await
            .unwrap();

        let handler = service.handler();
        let stale = handler.load(tenant_id, invoice_id).await.unwrap();

        // Writer A commits 8000.00.
        service
            .record_payment(RecordInvoicePayment::new(
                invoice_id,
                tenant_id,
                AggregateId::new(),
                Money::bdt(800_000).unwrap(),
            ))
            .await
            .unwrap();

        // Writer B still holds the stale version and tries 5000.00, which
        // combined would exceed 11500.00. Its append must lose.
        let stale_version = stale.version();
        let events = stale
            .record_payment(AggregateId::new(), Money::bdt(500_000).unwrap())
            .unwrap();
        let envelopes: Vec<_> = events
            .iter()
            .enumerate()
            .map(|(i, event)| {
                event_store::EventEnvelope::builder()
                    .tenant_id(tenant_id)
                    .aggregate_id(invoice_id)
                    .aggregate_type("Invoice")
                    .event_type(crate::aggregate::DomainEvent::event_type(event))
                    .version(event_store::Version::new(stale_version.as_i64() + 1 + i as i64))
                    .payload(event)
                    .unwrap()
                    .build()
            })
            .collect();

        let result = handler
            .store()
            .append(
                envelopes,
                event_store::AppendOptions::expect_version(stale_version),
            )
            .await;
        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));

        // The invoice still reflects exactly one payment.
        let invoice = service
            .get_invoice(tenant_id, invoice_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.paid_amount().minor(), 800_000);
    }
}
