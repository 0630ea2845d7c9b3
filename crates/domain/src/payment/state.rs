//! Payment state machine.

use serde::{Deserialize, Serialize};

/// The status of a payment in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──► Completed
///    │
///    └──────► Failed
/// ```
///
/// Completed and Failed are terminal; a payment transitions exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Payment has been initiated but not yet settled.
    #[default]
    Pending,

    /// Payment settled successfully (terminal state).
    Completed,

    /// Payment failed (terminal state).
    Failed,
}

impl PaymentStatus {
    /// Returns true if the payment can be completed from this status.
    pub fn can_complete(&self) -> bool {
        matches!(self, PaymentStatus::Pending)
    }

    /// Returns true if the payment can be failed from this status.
    pub fn can_fail(&self) -> bool {
        matches!(self, PaymentStatus::Pending)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
