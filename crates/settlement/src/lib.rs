//! Cross-aggregate payment settlement.
//!
//! Completing a payment and recording it against its invoice spans two
//! aggregates with no shared transaction. The [`SettlementCoordinator`] is
//! the one component allowed to sequence the two operations; consistency
//! across the boundary is eventual, with the invoice's own overpayment
//! check as the backstop.

pub mod coordinator;
pub mod error;

pub use coordinator::{SettlementCoordinator, SettlementOutcome};
pub use error::SettlementError;
