//! Payment aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;
mod state;
mod value_objects;

pub use aggregate::Payment;
pub use commands::*;
pub use events::{PaymentCompletedData, PaymentCreatedData, PaymentEvent, PaymentFailedData};
pub use service::PaymentService;
pub use state::PaymentStatus;
pub use value_objects::{PaymentMethod, WalletProvider};

use thiserror::Error;

use crate::money::{Money, MoneyError};

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Payment is already created.
    #[error("Payment already created")]
    AlreadyCreated,

    /// Payment is not in the expected status.
    #[error("Invalid status transition: cannot {action} a payment in {current_status} status")]
    InvalidStateTransition {
        current_status: PaymentStatus,
        action: &'static str,
    },

    /// Payment amounts must be strictly positive.
    #[error("Invalid payment amount: {amount} (must be greater than zero)")]
    InvalidAmount { amount: Money },

    /// A monetary arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}
