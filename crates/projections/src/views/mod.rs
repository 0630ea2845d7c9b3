//! Query-side read model views.

mod invoices;
mod payments;

pub use invoices::{InvoiceLedgerRow, InvoiceLedgerView};
pub use payments::{PaymentLedgerRow, PaymentLedgerView};
