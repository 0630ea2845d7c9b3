use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{EventEnvelope, EventQuery, EventStoreError, Result, Snapshot, StreamId, Version};

/// Options for appending events to the store.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected version of the stream for optimistic concurrency control.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stream to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the stream to not exist (new aggregate).
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// A stream of events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Core trait for event store implementations.
///
/// An event store is responsible for persisting and retrieving events.
/// Streams are tenant-namespaced (`tenant-{id}-{type}-{id}`), so every
/// operation that names a stream is tenant-scoped by construction.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events to a single stream.
    ///
    /// Events are appended atomically - either all succeed or none do.
    /// If `options.expected_version` is set, the operation will fail with
    /// `ConcurrencyConflict` if the current stream version doesn't match.
    ///
    /// Returns the new version of the stream after appending.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// Retrieves all events for a stream, in version order (oldest first).
    ///
    /// Reading never mutates the store and is repeatable.
    async fn read_stream(&self, stream_id: &StreamId) -> Result<Vec<EventEnvelope>>;

    /// Retrieves events for a stream starting from a specific version.
    ///
    /// Useful when replaying from a snapshot.
    async fn read_stream_from(
        &self,
        stream_id: &StreamId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>>;

    /// Retrieves events matching a query.
    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>>;

    /// Retrieves events by type.
    async fn events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>>;

    /// Streams all events in the store.
    ///
    /// Events are returned in insertion order; per-stream order is
    /// guaranteed, global cross-stream order is best-effort.
    async fn stream_all_events(&self) -> Result<EventStream>;

    /// Gets the current version of a stream.
    ///
    /// Returns None if the stream doesn't exist.
    async fn stream_version(&self, stream_id: &StreamId) -> Result<Option<Version>>;

    /// Saves a snapshot of an aggregate's state.
    ///
    /// If a snapshot already exists for this stream, it is replaced.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// Retrieves the latest snapshot for a stream.
    ///
    /// Returns None if no snapshot exists.
    async fn get_snapshot(&self, stream_id: &StreamId) -> Result<Option<Snapshot>>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Appends a single event to the store.
    async fn append_event(&self, event: EventEnvelope, options: AppendOptions) -> Result<Version> {
        self.append(vec![event], options).await
    }

    /// Checks if a stream exists (has any events).
    async fn stream_exists(&self, stream_id: &StreamId) -> Result<bool> {
        Ok(self.stream_version(stream_id).await?.is_some())
    }

    /// Loads a stream's events, optionally starting from a snapshot.
    ///
    /// If a snapshot exists, returns the snapshot and events after it.
    /// Otherwise, returns None and all events.
    async fn load_stream(
        &self,
        stream_id: &StreamId,
    ) -> Result<(Option<Snapshot>, Vec<EventEnvelope>)> {
        if let Some(snapshot) = self.get_snapshot(stream_id).await? {
            let events = self
                .read_stream_from(stream_id, snapshot.version.next())
                .await?;
            Ok((Some(snapshot), events))
        } else {
            let events = self.read_stream(stream_id).await?;
            Ok((None, events))
        }
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Validates a batch of events before appending.
///
/// All events in one append must target the same stream (which implies the
/// same tenant and aggregate) and carry sequential versions.
pub fn validate_events_for_append(events: &[EventEnvelope]) -> Result<()> {
    if events.is_empty() {
        return Err(EventStoreError::InvalidAppend(
            "cannot append empty event list".to_string(),
        ));
    }

    let first = &events[0];
    for event in events.iter().skip(1) {
        if event.stream_id != first.stream_id {
            return Err(EventStoreError::InvalidAppend(
                "all events must belong to the same stream".to_string(),
            ));
        }
        if event.tenant_id != first.tenant_id {
            return Err(EventStoreError::InvalidAppend(
                "all events must belong to the same tenant".to_string(),
            ));
        }
    }

    let mut expected_version = first.version;
    for event in events.iter().skip(1) {
        expected_version = expected_version.next();
        if event.version != expected_version {
            return Err(EventStoreError::InvalidAppend(format!(
                "event versions must be sequential: expected {}, got {}",
                expected_version, event.version
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{AggregateId, TenantId};

    fn envelope(
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        version: i64,
    ) -> EventEnvelope {
        EventEnvelope::builder()
            .tenant_id(tenant_id)
            .aggregate_id(aggregate_id)
            .aggregate_type("Invoice")
            .event_type("InvoiceCreated")
            .version(Version::new(version))
            .payload_raw(serde_json::json!({}))
            .build()
    }

    #[test]
    fn append_options_expect_new_uses_initial_version() {
        let options = AppendOptions::expect_new();
        assert_eq!(options.expected_version, Some(Version::initial()));
    }

    #[test]
    fn validate_rejects_empty_batch() {
        let result = validate_events_for_append(&[]);
        assert!(matches!(result, Err(EventStoreError::InvalidAppend(_))));
    }

    #[test]
    fn validate_rejects_mixed_streams() {
        let tenant_id = TenantId::new();
        let events = vec![
            envelope(tenant_id, AggregateId::new(), 1),
            envelope(tenant_id, AggregateId::new(), 2),
        ];
        let result = validate_events_for_append(&events);
        assert!(matches!(result, Err(EventStoreError::InvalidAppend(_))));
    }

    #[test]
    fn validate_rejects_version_gaps() {
        let tenant_id = TenantId::new();
        let aggregate_id = AggregateId::new();
        let events = vec![
            envelope(tenant_id, aggregate_id, 1),
            envelope(tenant_id, aggregate_id, 3),
        ];
        let result = validate_events_for_append(&events);
        assert!(matches!(result, Err(EventStoreError::InvalidAppend(_))));
    }

    #[test]
    fn validate_accepts_sequential_batch() {
        let tenant_id = TenantId::new();
        let aggregate_id = AggregateId::new();
        let events = vec![
            envelope(tenant_id, aggregate_id, 1),
            envelope(tenant_id, aggregate_id, 2),
            envelope(tenant_id, aggregate_id, 3),
        ];
        assert!(validate_events_for_append(&events).is_ok());
    }
}
