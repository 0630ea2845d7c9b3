//! Payment domain events.

use chrono::{DateTime, NaiveDate, Utc};
use common::{AggregateId, TenantId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::money::Money;

use super::PaymentMethod;

/// Events that can occur on a payment aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PaymentEvent {
    /// Payment was created in Pending.
    PaymentCreated(PaymentCreatedData),

    /// Payment settled successfully.
    PaymentCompleted(PaymentCompletedData),

    /// Payment failed.
    PaymentFailed(PaymentFailedData),
}

impl DomainEvent for PaymentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PaymentEvent::PaymentCreated(_) => "PaymentCreated",
            PaymentEvent::PaymentCompleted(_) => "PaymentCompleted",
            PaymentEvent::PaymentFailed(_) => "PaymentFailed",
        }
    }
}

/// Data for PaymentCreated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreatedData {
    /// The unique payment ID.
    pub payment_id: AggregateId,

    /// The tenant that owns the payment.
    pub tenant_id: TenantId,

    /// The invoice this payment is against (reference only; the payment
    /// does not own the invoice).
    pub invoice_id: AggregateId,

    /// Payment amount.
    pub amount: Money,

    /// How the payment is made.
    pub method: PaymentMethod,

    /// Payment date.
    pub payment_date: NaiveDate,

    /// Caller-supplied reference (e.g. bank slip number), if any.
    pub reference: Option<String>,

    /// Who initiated the payment.
    pub created_by: UserId,

    /// When the payment was created.
    pub created_at: DateTime<Utc>,
}

/// Data for PaymentCompleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCompletedData {
    /// Settlement reference assigned on completion.
    pub transaction_reference: String,

    /// When the payment settled.
    pub completed_at: DateTime<Utc>,
}

/// Data for PaymentFailed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentFailedData {
    /// Why the payment failed.
    pub reason: String,

    /// When the payment failed.
    pub failed_at: DateTime<Utc>,
}

// Convenience constructors for events
impl PaymentEvent {
    /// Creates a PaymentCreated event.
    #[allow(clippy::too_many_arguments)]
    pub fn created(
        payment_id: AggregateId,
        tenant_id: TenantId,
        invoice_id: AggregateId,
        amount: Money,
        method: PaymentMethod,
        payment_date: NaiveDate,
        reference: Option<String>,
        created_by: UserId,
    ) -> Self {
        PaymentEvent::PaymentCreated(PaymentCreatedData {
            payment_id,
            tenant_id,
            invoice_id,
            amount,
            method,
            payment_date,
            reference,
            created_by,
            created_at: Utc::now(),
        })
    }

    /// Creates a PaymentCompleted event.
    pub fn completed(transaction_reference: impl Into<String>) -> Self {
        PaymentEvent::PaymentCompleted(PaymentCompletedData {
            transaction_reference: transaction_reference.into(),
            completed_at: Utc::now(),
        })
    }

    /// Creates a PaymentFailed event.
    pub fn failed(reason: impl Into<String>) -> Self {
        PaymentEvent::PaymentFailed(PaymentFailedData {
            reason: reason.into(),
            failed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types() {
        let event = PaymentEvent::created(
            AggregateId::new(),
            TenantId::new(),
            AggregateId::new(),
            Money::bdt(10_000).unwrap(),
            PaymentMethod::Cash,
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            None,
            UserId::new(),
        );
        assert_eq!(event.event_type(), "PaymentCreated");

        let event = PaymentEvent::completed("TXN-123");
        assert_eq!(event.event_type(), "PaymentCompleted");

        let event = PaymentEvent::failed("insufficient funds");
        assert_eq!(event.event_type(), "PaymentFailed");
    }

    #[test]
    fn created_event_serialization() {
        let payment_id = AggregateId::new();
        let invoice_id = AggregateId::new();
        let event = PaymentEvent::created(
            payment_id,
            TenantId::new(),
            invoice_id,
            Money::bdt(1_150_000).unwrap(),
            PaymentMethod::MobileWallet {
                provider: crate::payment::WalletProvider::Bkash,
            },
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            Some("SLIP-42".to_string()),
            UserId::new(),
        );

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: PaymentEvent = serde_json::from_str(&json).unwrap();

        if let PaymentEvent::PaymentCreated(data) = deserialized {
            assert_eq!(data.payment_id, payment_id);
            assert_eq!(data.invoice_id, invoice_id);
            assert_eq!(data.amount.minor(), 1_150_000);
            assert_eq!(data.reference.as_deref(), Some("SLIP-42"));
        } else {
            panic!("Expected PaymentCreated event");
        }
    }

    #[test]
    fn failed_event_serialization() {
        let event = PaymentEvent::failed("wallet timeout");

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: PaymentEvent = serde_json::from_str(&json).unwrap();

        if let PaymentEvent::PaymentFailed(data) = deserialized {
            assert_eq!(data.reason, "wallet timeout");
        } else {
            panic!("Expected PaymentFailed event");
        }
    }
}
