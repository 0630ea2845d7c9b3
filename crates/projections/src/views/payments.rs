//! Payment ledger read model — one row per payment, keyed by tenant.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{AggregateId, TenantId};
use domain::{Money, PaymentEvent, PaymentMethod, PaymentStatus};
use event_store::{EventEnvelope, EventId};
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::{Page, ReadModel};

/// Denormalized payment row for the query side.
#[derive(Debug, Clone)]
pub struct PaymentLedgerRow {
    pub payment_id: AggregateId,
    pub tenant_id: TenantId,
    pub invoice_id: AggregateId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub reference: Option<String>,
    pub payment_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Read model view over all payments, keyed by (tenant, payment).
///
/// Same discipline as the invoice view: eventually consistent,
/// rebuildable, and idempotent under redelivery via event-ID dedup.
#[derive(Clone)]
pub struct PaymentLedgerView {
    rows: Arc<RwLock<HashMap<(TenantId, AggregateId), PaymentLedgerRow>>>,
    applied: Arc<RwLock<HashSet<EventId>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl PaymentLedgerView {
    /// Creates a new empty payment ledger view.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            applied: Arc::new(RwLock::new(HashSet::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets a single payment row.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        payment_id: AggregateId,
    ) -> Option<PaymentLedgerRow> {
        self.rows.read().await.get(&(tenant_id, payment_id)).cloned()
    }

    /// Lists a tenant's payments, newest first, paginated.
    pub async fn list(&self, tenant_id: TenantId, page: Page) -> Vec<PaymentLedgerRow> {
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

    /// Lists a tenant's payments against a specific invoice.
    pub async fn list_by_invoice(
        &self,
        tenant_id: TenantId,
        invoice_id: AggregateId,
        page: Page,
    ) -> Vec<PaymentLedgerRow> {
        let rows = self.rows.read().await;
        let mut matching: Vec<_> = rows
            .values()
            .filter(|row| row.tenant_id == tenant_id && row.invoice_id == invoice_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect()
    }

    /// Lists a tenant's payments filtered by status.
    pub async fn list_by_status(
        &self,
        tenant_id: TenantId,
        status: PaymentStatus,
        page: Page,
    ) -> Vec<PaymentLedgerRow> {
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
}

impl Default for PaymentLedgerView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for PaymentLedgerView {
    fn name(&self) -> &'static str {
        "PaymentLedgerView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let advance = || async {
            let mut pos = self.position.write().await;
            *pos = pos.advance();
        };

        if event.aggregate_type != "Payment" {
            advance().await;
            return Ok(());
        }

        {
            let mut applied = self.applied.write().await;
            if !applied.insert(event.event_id) {
                advance().await;
                return Ok(());
            }
        }

        let payment_event: PaymentEvent = serde_json::from_value(event.payload.clone())?;
        let key = (event.tenant_id, event.aggregate_id);

        let mut rows = self.rows.write().await;

        match payment_event {
            PaymentEvent::PaymentCreated(data) => {
                rows.insert(
                    key,
                    PaymentLedgerRow {
                        payment_id: data.payment_id,
                        tenant_id: data.tenant_id,
                        invoice_id: data.invoice_id,
                        amount: data.amount,
                        method: data.method,
                        status: PaymentStatus::Pending,
                        transaction_reference: None,
                        failure_reason: None,
                        reference: data.reference,
                        payment_date: data.payment_date,
                        created_at: data.created_at,
                        updated_at: data.created_at,
                        resolved_at: None,
                    },
                );
            }
            PaymentEvent::PaymentCompleted(data) => {
                if let Some(row) = rows.get_mut(&key) {
                    row.status = PaymentStatus::Completed;
                    row.transaction_reference = Some(data.transaction_reference);
                    row.updated_at = data.completed_at;
                    row.resolved_at = Some(data.completed_at);
                }
            }
            PaymentEvent::PaymentFailed(data) => {
                if let Some(row) = rows.get_mut(&key) {
                    row.status = PaymentStatus::Failed;
                    row.failure_reason = Some(data.reason);
                    row.updated_at = data.failed_at;
                    row.resolved_at = Some(data.failed_at);
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

impl ReadModel for PaymentLedgerView {
    fn name(&self) -> &'static str {
        "PaymentLedgerView"
    }

    fn count(&self) -> usize {
        self.rows.try_read().map(|r| r.len()).unwrap_or(0)
    }
}
