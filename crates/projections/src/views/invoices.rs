//! Invoice ledger read model — one row per invoice, keyed by tenant.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{AggregateId, TenantId};
use domain::{Currency, CustomerId, InvoiceEvent, InvoiceStatus, Money, VendorId};
use event_store::{EventEnvelope, EventId};
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::{Page, ReadModel};

/// Denormalized invoice row for the query side.
#[derive(Debug, Clone)]
pub struct InvoiceLedgerRow {
    pub invoice_id: AggregateId,
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub vendor_id: VendorId,
    pub status: InvoiceStatus,
    pub currency: Currency,
    pub subtotal: Money,
    pub vat_amount: Money,
    pub grand_total: Money,
    pub paid_amount: Money,
    /// grand_total - paid_amount, maintained on every payment event.
    pub balance_amount: Money,
    pub line_item_count: usize,
    pub mushak_number: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_reason: Option<String>,
    pub fiscal_year: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read model view over all invoices, keyed by (tenant, invoice).
///
/// Rows are eventually consistent with the write side and rebuildable at
/// any time by replaying the event log. Handling is idempotent under
/// at-least-once redelivery: each applied event ID is remembered and
/// duplicates are skipped.
#[derive(Clone)]
pub struct InvoiceLedgerView {
    rows: Arc<RwLock<HashMap<(TenantId, AggregateId), InvoiceLedgerRow>>>,
    applied: Arc<RwLock<HashSet<EventId>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl InvoiceLedgerView {
    /// Creates a new empty invoice ledger view.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            applied: Arc::new(RwLock::new(HashSet::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets a single invoice row.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        invoice_id: AggregateId,
    ) -> Option<InvoiceLedgerRow> {
        self.rows.read().await.get(&(tenant_id, invoice_id)).cloned()
    }

    /// Lists a tenant's invoices, newest first, paginated.
    pub async fn list(&self, tenant_id: TenantId, page: Page) -> Vec<InvoiceLedgerRow> {
        let rows = self.rows.read().await;
        let mut matching: Vec<_> = rows
            .values()
            .filter(|row| row.tenant_id == tenant_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect()
    }

    /// Lists a tenant's invoices filtered by status.
    pub async fn list_by_status(
        &self,
        tenant_id: TenantId,
        status: InvoiceStatus,
        page: Page,
    ) -> Vec<InvoiceLedgerRow> {
        let rows = self.rows.read().await;
        let mut matching: Vec<_> = rows
            .values()
            .filter(|row| row.tenant_id == tenant_id && row.status == status)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect()
    }

    /// Lists a tenant's invoices for a customer.
    pub async fn list_by_customer(
        &self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        page: Page,
    ) -> Vec<InvoiceLedgerRow> {
        let rows = self.rows.read().await;
        let mut matching: Vec<_> = rows
            .values()
            .filter(|row| row.tenant_id == tenant_id && row.customer_id == customer_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect()
    }
}

impl Default for InvoiceLedgerView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for InvoiceLedgerView {
    fn name(&self) -> &'static str {
        "InvoiceLedgerView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let advance = || async {
            let mut pos = self.position.write().await;
            *pos = pos.advance();
        };

        if event.aggregate_type != "Invoice" {
            advance().await;
            return Ok(());
        }

        // At-least-once delivery: skip events this view has already applied.
        {
            let mut applied = self.applied.write().await;
            if !applied.insert(event.event_id) {
                advance().await;
                return Ok(());
            }
        }

        let invoice_event: InvoiceEvent = serde_json::from_value(event.payload.clone())?;
        let key = (event.tenant_id, event.aggregate_id);

        let mut rows = self.rows.write().await;

        match invoice_event {
            InvoiceEvent::InvoiceCreated(data) => {
                rows.insert(
                    key,
                    InvoiceLedgerRow {
                        invoice_id: data.invoice_id,
                        tenant_id: data.tenant_id,
                        customer_id: data.customer_id,
                        vendor_id: data.vendor_id,
                        status: InvoiceStatus::Draft,
                        currency: data.totals.grand_total.currency(),
                        subtotal: data.totals.subtotal,
                        vat_amount: data.totals.vat_amount,
                        grand_total: data.totals.grand_total,
                        paid_amount: Money::zero(data.totals.grand_total.currency()),
                        balance_amount: data.totals.grand_total,
                        line_item_count: data.line_items.len(),
                        mushak_number: None,
                        paid_at: None,
                        cancelled_reason: None,
                        fiscal_year: data.fiscal_year,
                        invoice_date: data.invoice_date,
                        due_date: data.due_date,
                        created_at: data.created_at,
                        updated_at: data.created_at,
                    },
                );
            }
            InvoiceEvent::InvoiceLineItemAdded(data) => {
                if let Some(row) = rows.get_mut(&key) {
                    row.line_item_count += 1;
                    row.subtotal = data.totals.subtotal;
                    row.vat_amount = data.totals.vat_amount;
                    row.grand_total = data.totals.grand_total;
                    row.balance_amount = data.totals.grand_total;
                    row.updated_at = event.timestamp;
                }
            }
            InvoiceEvent::InvoiceLineItemRemoved(data) => {
                if let Some(row) = rows.get_mut(&key) {
                    row.line_item_count = row.line_item_count.saturating_sub(1);
                    row.subtotal = data.totals.subtotal;
                    row.vat_amount = data.totals.vat_amount;
                    row.grand_total = data.totals.grand_total;
                    row.balance_amount = data.totals.grand_total;
                    row.updated_at = event.timestamp;
                }
            }
            InvoiceEvent::InvoiceApproved(data) => {
                if let Some(row) = rows.get_mut(&key) {
                    row.status = InvoiceStatus::Approved;
                    row.mushak_number = Some(data.mushak_number);
                    row.updated_at = data.approved_at;
                }
            }
            InvoiceEvent::InvoicePaymentRecorded(data) => {
                if let Some(row) = rows.get_mut(&key) {
                    row.paid_amount = data.new_paid_amount;
                    row.balance_amount = data.remaining_amount;
                    row.updated_at = data.recorded_at;
                }
            }
            InvoiceEvent::InvoiceFullyPaid(data) => {
                if let Some(row) = rows.get_mut(&key) {
                    row.status = InvoiceStatus::Paid;
                    row.paid_at = Some(data.paid_at);
                    row.updated_at = data.paid_at;
                }
            }
            InvoiceEvent::InvoiceCancelled(data) => {
                if let Some(row) = rows.get_mut(&key) {
                    row.status = InvoiceStatus::Cancelled;
                    row.cancelled_reason = Some(data.reason);
                    row.updated_at = data.cancelled_at;
                }
            }
        }

        advance().await;

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.rows.write().await.clear();
        self.applied.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for InvoiceLedgerView {
    fn name(&self) -> &'static str {
        "InvoiceLedgerView"
    }

    fn count(&self) -> usize {
        // Use try_read to avoid blocking; returns 0 if lock is held
        self.rows.try_read().map(|r| r.len()).unwrap_or(0)
    }
}
