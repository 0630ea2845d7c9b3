//! Domain layer for the event-sourced ledger core.
//!
//! This crate provides the core domain abstractions including:
//! - Money and Bangladesh VAT/tax calculation
//! - Aggregate trait for event-sourced entities
//! - DomainEvent trait for domain events
//! - Command trait and CommandHandler for command processing
//! - Invoice and Payment aggregates with their state machines

pub mod aggregate;
pub mod command;
pub mod error;
pub mod invoice;
pub mod money;
pub mod payment;
pub mod tax;

pub use aggregate::{Aggregate, DomainEvent, SnapshotCapable};
pub use command::{Command, CommandHandler, CommandResult};
pub use error::DomainError;
pub use invoice::{
    AddLineItem, ApproveInvoice, CancelInvoice, CreateInvoice, CustomerId, Invoice, InvoiceError,
    InvoiceEvent, InvoiceService, InvoiceStatus, LineItem, RecordInvoicePayment, RemoveLineItem,
    VendorId,
};
pub use money::{Currency, Money, MoneyError, TaxRate};
pub use payment::{
    CompletePayment, CreatePayment, FailPayment, Payment, PaymentError, PaymentEvent,
    PaymentMethod, PaymentService, PaymentStatus, WalletProvider,
};
pub use tax::{TaxBreakdown, TaxCalculator, VatCategory, fiscal_year, mushak_number};
