//! Payment service providing a simplified API for payment operations.

use std::sync::Arc;

use common::{AggregateId, TenantId};
use event_store::{EventPublisher, EventStore};

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{CompletePayment, CreatePayment, FailPayment, Payment};

impl From<super::PaymentError> for DomainError {
    fn from(e: super::PaymentError) -> Self {
        DomainError::Payment(e)
    }
}

/// Service for managing payments.
///
/// Completing a payment here only settles the payment aggregate; recording
/// it against the invoice is the settlement coordinator's responsibility.
pub struct PaymentService<S: EventStore> {
    handler: CommandHandler<S, Payment>,
}

impl<S: EventStore> PaymentService<S> {
    /// Creates a new payment service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Sets the publisher that receives events after each successful append.
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.handler = self.handler.with_publisher(publisher);
        self
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Payment> {
        &self.handler
    }

    /// Creates a new payment.
    #[tracing::instrument(skip(self, cmd), fields(payment_id = %cmd.payment_id, tenant_id = %cmd.tenant_id))]
    pub async fn create_payment(
        &self,
        cmd: CreatePayment,
    ) -> Result<CommandResult<Payment>, DomainError> {
        self.handler
            .execute(cmd.tenant_id, cmd.payment_id, |payment| {
                payment.create(&cmd)
            })
            .await
    }

    /// Completes a pending payment.
    #[tracing::instrument(skip(self, cmd), fields(payment_id = %cmd.payment_id))]
    pub async fn complete_payment(
        &self,
        cmd: CompletePayment,
    ) -> Result<CommandResult<Payment>, DomainError> {
        let reference = cmd.transaction_reference.clone();

        self.handler
            .execute(cmd.tenant_id, cmd.payment_id, |payment| {
                payment.complete(reference)
            })
            .await
    }

    /// Fails a pending payment. Does not touch the invoice.
    #[tracing::instrument(skip(self, cmd), fields(payment_id = %cmd.payment_id))]
    pub async fn fail_payment(
        &self,
        cmd: FailPayment,
    ) -> Result<CommandResult<Payment>, DomainError> {
        let reason = cmd.reason.clone();

        self.handler
            .execute(cmd.tenant_id, cmd.payment_id, |payment| {
                payment.fail(reason)
            })
            .await
    }

    /// Loads a payment by ID, reading through its event stream.
    ///
    /// Returns None if the payment doesn't exist under this tenant.
    #[tracing::instrument(skip(self))]
    pub async fn get_payment(
        &self,
        tenant_id: TenantId,
        payment_id: AggregateId,
    ) -> Result<Option<Payment>, DomainError> {
        self.handler.load_existing(tenant_id, payment_id).await
    }
}
