//! Payment commands.

use chrono::NaiveDate;
use common::{AggregateId, TenantId, UserId};

use crate::command::Command;
use crate::money::Money;

use super::{Payment, PaymentMethod};

/// Command to create a new payment in Pending.
#[derive(Debug, Clone)]
pub struct CreatePayment {
    /// The payment ID to create.
    pub payment_id: AggregateId,

    /// The tenant that owns the payment.
    pub tenant_id: TenantId,

    /// The invoice this payment is against.
    pub invoice_id: AggregateId,

    /// Payment amount; must be strictly positive.
    pub amount: Money,

    /// How the payment is made.
    pub method: PaymentMethod,

    /// Payment date.
    pub payment_date: NaiveDate,

    /// Caller-supplied reference (e.g. bank slip number), if any.
    pub reference: Option<String>,

    /// Who is initiating the payment.
    pub created_by: UserId,
}

impl CreatePayment {
    /// Creates a command with a generated payment ID.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_id: TenantId,
        invoice_id: AggregateId,
        amount: Money,
        method: PaymentMethod,
        payment_date: NaiveDate,
        reference: Option<String>,
        created_by: UserId,
    ) -> Self {
        Self {
            payment_id: AggregateId::new(),
            tenant_id,
            invoice_id,
            amount,
            method,
            payment_date,
            reference,
            created_by,
        }
    }
}

impl Command for CreatePayment {
    type Aggregate = Payment;

    fn aggregate_id(&self) -> AggregateId {
        self.payment_id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Command to complete a pending payment.
#[derive(Debug, Clone)]
pub struct CompletePayment {
    /// The payment to complete.
    pub payment_id: AggregateId,

    /// The tenant that owns the payment.
    pub tenant_id: TenantId,

    /// Settlement reference from the payment channel.
    pub transaction_reference: String,

    /// Who is completing the payment.
    pub completed_by: UserId,
}

impl CompletePayment {
    /// Creates a new CompletePayment command.
    pub fn new(
        payment_id: AggregateId,
        tenant_id: TenantId,
        transaction_reference: impl Into<String>,
        completed_by: UserId,
    ) -> Self {
        Self {
            payment_id,
            tenant_id,
            transaction_reference: transaction_reference.into(),
            completed_by,
        }
    }
}

impl Command for CompletePayment {
    type Aggregate = Payment;

    fn aggregate_id(&self) -> AggregateId {
        self.payment_id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Command to fail a pending payment.
#[derive(Debug, Clone)]
pub struct FailPayment {
    /// The payment to fail.
    pub payment_id: AggregateId,

    /// The tenant that owns the payment.
    pub tenant_id: TenantId,

    /// Why the payment failed.
    pub reason: String,

    /// Who is failing the payment.
    pub failed_by: UserId,
}

impl FailPayment {
    /// Creates a new FailPayment command.
    pub fn new(
        payment_id: AggregateId,
        tenant_id: TenantId,
        reason: impl Into<String>,
        failed_by: UserId,
    ) -> Self {
        Self {
            payment_id,
            tenant_id,
            reason: reason.into(),
            failed_by,
        }
    }
}

impl Command for FailPayment {
    type Aggregate = Payment;

    fn aggregate_id(&self) -> AggregateId {
        self.payment_id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
