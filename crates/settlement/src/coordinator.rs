//! Coordinator for the payment -> invoice settlement flow.

use std::sync::Arc;

use common::{AggregateId, TenantId, UserId};
use domain::{
    CompletePayment, FailPayment, Invoice, InvoiceService, Payment, PaymentService,
    PaymentStatus, RecordInvoicePayment,
};
use event_store::{EventPublisher, EventStore};

use crate::error::SettlementError;

/// How many times the invoice-side append is retried after losing an
/// optimistic-concurrency race to another writer.
const MAX_RECORD_ATTEMPTS: u32 = 3;

/// Result of a successful settlement.
#[derive(Debug)]
pub struct SettlementOutcome {
    /// The payment after completion.
    pub payment: Payment,

    /// The invoice after the payment was recorded against it.
    pub invoice: Invoice,
}

/// Orchestrates the two-aggregate settlement flow.
///
/// The sequence is: validate the invoice can take the amount (fail fast
/// while the payment is still Pending), complete the payment, then record
/// it against the invoice. Two payments racing the same invoice are
/// serialized by the invoice stream's optimistic concurrency; the losing
/// writer reloads and retries here, and the invoice's overpayment guard
/// keeps a lost race from ever double-applying.
pub struct SettlementCoordinator<S: EventStore> {
    invoice_service: InvoiceService<S>,
    payment_service: PaymentService<S>,
}

impl<S: EventStore + Clone> SettlementCoordinator<S> {
    /// Creates a new coordinator over the given event store.
    pub fn new(store: S) -> Self {
        Self {
            invoice_service: InvoiceService::new(store.clone()),
            payment_service: PaymentService::new(store),
        }
    }

    /// Creates a coordinator whose services publish to the given publisher.
    pub fn with_publisher(store: S, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            invoice_service: InvoiceService::new(store.clone()).with_publisher(publisher.clone()),
            payment_service: PaymentService::new(store).with_publisher(publisher),
        }
    }

    /// Returns the invoice service.
    pub fn invoice_service(&self) -> &InvoiceService<S> {
        &self.invoice_service
    }

    /// Returns the payment service.
    pub fn payment_service(&self) -> &PaymentService<S> {
        &self.payment_service
    }

    /// Settles a pending payment: completes it, then records it against
    /// its invoice.
    ///
    /// Safe under at-least-once delivery: re-settling an already-completed
    /// payment no-ops on the payment side and the invoice's per-payment-ID
    /// dedup no-ops on the invoice side.
    #[tracing::instrument(skip(self, transaction_reference), fields(tenant_id = %tenant_id, payment_id = %payment_id))]
    pub async fn settle_payment(
        &self,
        tenant_id: TenantId,
        payment_id: AggregateId,
        transaction_reference: impl Into<String> + Send,
        settled_by: UserId,
    ) -> Result<SettlementOutcome, SettlementError> {
        metrics::counter!("settlement_attempts").increment(1);

        // 1. Load and validate the payment
        let payment = self
            .payment_service
            .get_payment(tenant_id, payment_id)
            .await?
            .ok_or(SettlementError::PaymentNotFound(payment_id))?;

        if payment.status() == PaymentStatus::Failed {
            return Err(SettlementError::PaymentNotSettleable {
                payment_id,
                status: payment.status(),
            });
        }

        let invoice_id = payment
            .invoice_id()
            .ok_or(SettlementError::PaymentNotFound(payment_id))?;
        let amount = payment.amount();

        // 2. Fail fast while the payment is still Pending: if the invoice
        // cannot take the amount now, reject without burning the payment's
        // one terminal transition. A writer that sneaks in between this
        // check and the record step is caught by the invoice's own guard.
        let invoice = self
            .invoice_service
            .get_invoice(tenant_id, invoice_id)
            .await?
            .ok_or(SettlementError::InvoiceNotFound(invoice_id))?;

        let already_recorded = invoice.has_recorded_payment(payment_id);
        if !already_recorded && !invoice.can_accept_payment(amount) {
            metrics::counter!("settlement_rejected").increment(1);
            return Err(SettlementError::InvoiceCannotAccept {
                invoice_id,
                amount,
                balance: invoice.balance(),
            });
        }

        // 3. Complete the payment (no-op if already Completed)
        let payment_result = self
            .payment_service
            .complete_payment(CompletePayment::new(
                payment_id,
                tenant_id,
                transaction_reference.into(),
                settled_by,
            ))
            .await?;

        // 4. Record against the invoice, retrying the read-modify-append
        // cycle when a concurrent payment advanced the invoice stream.
        let mut attempts = 0;
        let invoice = loop {
            attempts += 1;
            match self
                .invoice_service
                .record_payment(RecordInvoicePayment::new(
                    invoice_id, tenant_id, payment_id, amount,
                ))
                .await
            {
                Ok(result) => break result.aggregate,
                Err(e) if e.is_concurrency_conflict() && attempts < MAX_RECORD_ATTEMPTS => {
                    tracing::warn!(
                        %invoice_id,
                        attempts,
                        "invoice append lost a concurrency race, retrying"
                    );
                    metrics::counter!("settlement_record_retries").increment(1);
                }
                Err(e) if e.is_concurrency_conflict() => {
                    return Err(SettlementError::RetriesExhausted {
                        invoice_id,
                        attempts,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        };

        metrics::counter!("settlement_completed").increment(1);
        tracing::info!(
            %invoice_id,
            paid = %invoice.paid_amount(),
            balance = %invoice.balance(),
            status = %invoice.status(),
            "payment settled"
        );

        Ok(SettlementOutcome {
            payment: payment_result.aggregate,
            invoice,
        })
    }

    /// Declines a pending payment. Does not touch the invoice.
    #[tracing::instrument(skip(self, reason), fields(tenant_id = %tenant_id, payment_id = %payment_id))]
    pub async fn decline_payment(
        &self,
        tenant_id: TenantId,
        payment_id: AggregateId,
        reason: impl Into<String> + Send,
        declined_by: UserId,
    ) -> Result<Payment, SettlementError> {
        let payment = self
            .payment_service
            .get_payment(tenant_id, payment_id)
            .await?
            .ok_or(SettlementError::PaymentNotFound(payment_id))?;

        if payment.status() == PaymentStatus::Completed {
            return Err(SettlementError::PaymentNotSettleable {
                payment_id,
                status: payment.status(),
            });
        }

        let result = self
            .payment_service
            .fail_payment(FailPayment::new(
                payment_id,
                tenant_id,
                reason.into(),
                declined_by,
            ))
            .await?;

        metrics::counter!("settlement_declined").increment(1);

        Ok(result.aggregate)
    }
}
