//! Payment aggregate implementation.

use chrono::{DateTime, NaiveDate, Utc};
use common::{AggregateId, TenantId};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::money::Money;

use super::{
    CreatePayment, PaymentError, PaymentEvent, PaymentMethod, PaymentStatus,
    events::{PaymentCompletedData, PaymentCreatedData, PaymentFailedData},
};

/// Payment aggregate root.
///
/// Tracks a single payment from Pending to exactly one of Completed or
/// Failed. The payment references its invoice by ID only; it never mutates
/// invoice state itself (that is the settlement coordinator's job).
///
/// `transaction_reference` is Some exactly when the payment is Completed;
/// `failure_reason` is Some exactly when it is Failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payment {
    /// Unique payment identifier.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// Tenant that owns this payment.
    tenant_id: Option<TenantId>,

    /// The invoice this payment is against.
    invoice_id: Option<AggregateId>,

    /// Payment amount; strictly positive.
    amount: Money,

    /// How the payment is made.
    method: Option<PaymentMethod>,

    /// Current lifecycle status.
    status: PaymentStatus,

    /// Settlement reference, assigned on completion.
    transaction_reference: Option<String>,

    /// Failure reason, assigned on failure.
    failure_reason: Option<String>,

    /// Payment date.
    payment_date: Option<NaiveDate>,

    /// Caller-supplied reference from creation.
    reference: Option<String>,

    /// When the payment reached a terminal status.
    resolved_at: Option<DateTime<Utc>>,
}

impl Aggregate for Payment {
    type Event = PaymentEvent;
    type Error = PaymentError;

    fn aggregate_type() -> &'static str {
        "Payment"
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
            PaymentEvent::PaymentCreated(data) => self.apply_created(data),
            PaymentEvent::PaymentCompleted(data) => self.apply_completed(data),
            PaymentEvent::PaymentFailed(data) => self.apply_failed(data),
        }
    }
}

impl SnapshotCapable for Payment {}

// Query methods
impl Payment {
    /// Returns the invoice this payment is against.
    pub fn invoice_id(&self) -> Option<AggregateId> {
        self.invoice_id
    }

    /// Returns the payment amount.
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Returns the payment method.
    pub fn method(&self) -> Option<PaymentMethod> {
        self.method
    }

    /// Returns the current status.
    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    /// Returns the settlement reference, Some once Completed.
    pub fn transaction_reference(&self) -> Option<&str> {
        self.transaction_reference.as_deref()
    }

    /// Returns the failure reason, Some once Failed.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns the payment date.
    pub fn payment_date(&self) -> Option<NaiveDate> {
        self.payment_date
    }

    /// Returns the caller-supplied reference from creation.
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Returns when the payment reached a terminal status.
    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Returns true if the payment is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods (return events)
impl Payment {
    /// Creates a new payment in Pending.
    ///
    /// Rejects non-positive amounts.
    pub fn create(&self, cmd: &CreatePayment) -> Result<Vec<PaymentEvent>, PaymentError> {
        if self.id.is_some() {
            return Err(PaymentError::AlreadyCreated);
        }

        if !cmd.amount.is_positive() {
            return Err(PaymentError::InvalidAmount { amount: cmd.amount });
        }

        Ok(vec![PaymentEvent::created(
            cmd.payment_id,
            cmd.tenant_id,
            cmd.invoice_id,
            cmd.amount,
            cmd.method,
            cmd.payment_date,
            cmd.reference.clone(),
            cmd.created_by,
        )])
    }

    /// Completes the payment, assigning its settlement reference.
    ///
    /// A no-op on an already-completed payment; rejected once Failed.
    pub fn complete(
        &self,
        transaction_reference: impl Into<String>,
    ) -> Result<Vec<PaymentEvent>, PaymentError> {
        if self.status == PaymentStatus::Completed {
            return Ok(vec![]);
        }

        if !self.status.can_complete() {
            return Err(PaymentError::InvalidStateTransition {
                current_status: self.status,
                action: "complete",
            });
        }

        Ok(vec![PaymentEvent::completed(transaction_reference)])
    }

    /// Fails the payment with a reason. Does not touch the invoice.
    ///
    /// A no-op on an already-failed payment; rejected once Completed.
    pub fn fail(&self, reason: impl Into<String>) -> Result<Vec<PaymentEvent>, PaymentError> {
        if self.status == PaymentStatus::Failed {
            return Ok(vec![]);
        }

        if !self.status.can_fail() {
            return Err(PaymentError::InvalidStateTransition {
                current_status: self.status,
                action: "fail",
            });
        }

        Ok(vec![PaymentEvent::failed(reason)])
    }
}

// Apply event helpers
impl Payment {
    fn apply_created(&mut self, data: PaymentCreatedData) {
        self.id = Some(data.payment_id);
        self.tenant_id = Some(data.tenant_id);
        self.invoice_id = Some(data.invoice_id);
        self.amount = data.amount;
        self.method = Some(data.method);
        self.status = PaymentStatus::Pending;
        self.payment_date = Some(data.payment_date);
        self.reference = data.reference;
    }

    fn apply_completed(&mut self, data: PaymentCompletedData) {
        self.status = PaymentStatus::Completed;
        self.transaction_reference = Some(data.transaction_reference);
        self.resolved_at = Some(data.completed_at);
    }

    fn apply_failed(&mut self, data: PaymentFailedData) {
        self.status = PaymentStatus::Failed;
        self.failure_reason = Some(data.reason);
        self.resolved_at = Some(data.failed_at);
    }
}
