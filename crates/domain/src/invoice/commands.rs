//! Invoice commands.

use chrono::NaiveDate;
use common::{AggregateId, TenantId, UserId};

use crate::command::Command;
use crate::money::Money;

use super::{CustomerId, Invoice, LineItem, VendorId};

/// Command to create a new invoice in Draft.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    /// The invoice ID to create.
    pub invoice_id: AggregateId,

    /// The tenant that owns the invoice.
    pub tenant_id: TenantId,

    /// The customer being billed.
    pub customer_id: CustomerId,

    /// The vendor issuing the invoice.
    pub vendor_id: VendorId,

    /// Invoice date; determines the fiscal year.
    pub invoice_date: NaiveDate,

    /// Payment due date.
    pub due_date: NaiveDate,

    /// Initial line items (may be empty while drafting).
    pub line_items: Vec<LineItem>,

    /// Who is creating the invoice.
    pub created_by: UserId,
}

impl CreateInvoice {
    /// Creates a command with a generated invoice ID.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_id: TenantId,
        customer_id: CustomerId,
        vendor_id: VendorId,
        invoice_date: NaiveDate,
        due_date: NaiveDate,
        line_items: Vec<LineItem>,
        created_by: UserId,
    ) -> Self {
        Self {
            invoice_id: AggregateId::new(),
            tenant_id,
            customer_id,
            vendor_id,
            invoice_date,
            due_date,
            line_items,
            created_by,
        }
    }
}

impl Command for CreateInvoice {
    type Aggregate = Invoice;

    fn aggregate_id(&self) -> AggregateId {
        self.invoice_id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Command to add a line item to a Draft invoice.
#[derive(Debug, Clone)]
pub struct AddLineItem {
    /// The invoice to modify.
    pub invoice_id: AggregateId,

    /// The tenant that owns the invoice.
    pub tenant_id: TenantId,

    /// The line item to add.
    pub line_item: LineItem,
}

impl AddLineItem {
    /// Creates a new AddLineItem command.
    pub fn new(invoice_id: AggregateId, tenant_id: TenantId, line_item: LineItem) -> Self {
        Self {
            invoice_id,
            tenant_id,
            line_item,
        }
    }
}

impl Command for AddLineItem {
    type Aggregate = Invoice;

    fn aggregate_id(&self) -> AggregateId {
        self.invoice_id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Command to remove a line item from a Draft invoice.
#[derive(Debug, Clone)]
pub struct RemoveLineItem {
    /// The invoice to modify.
    pub invoice_id: AggregateId,

    /// The tenant that owns the invoice.
    pub tenant_id: TenantId,

    /// Position of the line item to remove.
    pub index: usize,
}

impl RemoveLineItem {
    /// Creates a new RemoveLineItem command.
    pub fn new(invoice_id: AggregateId, tenant_id: TenantId, index: usize) -> Self {
        Self {
            invoice_id,
            tenant_id,
            index,
        }
    }
}

impl Command for RemoveLineItem {
    type Aggregate = Invoice;

    fn aggregate_id(&self) -> AggregateId {
        self.invoice_id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Command to approve an invoice.
#[derive(Debug, Clone)]
pub struct ApproveInvoice {
    /// The invoice to approve.
    pub invoice_id: AggregateId,

    /// The tenant that owns the invoice.
    pub tenant_id: TenantId,

    /// Who is approving.
    pub approved_by: UserId,
}

impl ApproveInvoice {
    /// Creates a new ApproveInvoice command.
    pub fn new(invoice_id: AggregateId, tenant_id: TenantId, approved_by: UserId) -> Self {
        Self {
            invoice_id,
            tenant_id,
            approved_by,
        }
    }
}

impl Command for ApproveInvoice {
    type Aggregate = Invoice;

    fn aggregate_id(&self) -> AggregateId {
        self.invoice_id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Command to record a completed payment against an invoice.
#[derive(Debug, Clone)]
pub struct RecordInvoicePayment {
    /// The invoice being paid.
    pub invoice_id: AggregateId,

    /// The tenant that owns the invoice.
    pub tenant_id: TenantId,

    /// The completed payment being recorded.
    pub payment_id: AggregateId,

    /// Amount of the payment.
    pub amount: Money,
}

impl RecordInvoicePayment {
    /// Creates a new RecordInvoicePayment command.
    pub fn new(
        invoice_id: AggregateId,
        tenant_id: TenantId,
        payment_id: AggregateId,
        amount: Money,
    ) -> Self {
        Self {
            invoice_id,
            tenant_id,
            payment_id,
            amount,
        }
    }
}

impl Command for RecordInvoicePayment {
    type Aggregate = Invoice;

    fn aggregate_id(&self) -> AggregateId {
        self.invoice_id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Command to cancel an invoice.
#[derive(Debug, Clone)]
pub struct CancelInvoice {
    /// The invoice to cancel.
    pub invoice_id: AggregateId,

    /// The tenant that owns the invoice.
    pub tenant_id: TenantId,

    /// Reason for cancellation (required).
    pub reason: String,

    /// Who is cancelling.
    pub cancelled_by: UserId,
}

impl CancelInvoice {
    /// Creates a new CancelInvoice command.
    pub fn new(
        invoice_id: AggregateId,
        tenant_id: TenantId,
        reason: impl Into<String>,
        cancelled_by: UserId,
    ) -> Self {
        Self {
            invoice_id,
            tenant_id,
            reason: reason.into(),
            cancelled_by,
        }
    }
}

impl Command for CancelInvoice {
    type Aggregate = Invoice;

    fn aggregate_id(&self) -> AggregateId {
        self.invoice_id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
