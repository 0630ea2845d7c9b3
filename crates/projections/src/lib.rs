//! Read models and projections for the CQRS query side.
//!
//! This crate provides the query side of the ledger:
//! - [`Projection`] trait for processing events into read models
//! - [`ReadModel`] trait for query access to denormalized data
//! - [`ProjectionProcessor`] for feeding events from the store to
//!   projections; it also implements `EventPublisher` so command services
//!   can push events as they commit
//! - Two read model views keyed by (tenant, aggregate): invoices and
//!   payments

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::{Page, ReadModel};
pub use views::{InvoiceLedgerRow, InvoiceLedgerView, PaymentLedgerRow, PaymentLedgerView};
