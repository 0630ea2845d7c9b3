//! Event publication to read-side subscribers.
//!
//! Publication is explicit: command handlers hold an [`EventPublisher`]
//! handle injected at construction, with lifecycle owned by the application
//! bootstrap. There is no ambient global bus. Delivery is at-least-once;
//! subscribers must tolerate redelivery.

use async_trait::async_trait;

use crate::{EventEnvelope, Result};

/// Delivers durably appended events to read-side subscribers.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes a batch of appended events, in order.
    async fn publish(&self, events: &[EventEnvelope]) -> Result<()>;
}

/// A publisher that drops every event.
///
/// Used by contexts with no read side (benchmarks, focused tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPublisher;

#[async_trait]
impl EventPublisher for NullPublisher {
    async fn publish(&self, _events: &[EventEnvelope]) -> Result<()> {
        Ok(())
    }
}
