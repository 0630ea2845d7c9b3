//! Projection processor for feeding events to projections.

use async_trait::async_trait;
use event_store::{EventEnvelope, EventPublisher, EventStore};
use futures_util::StreamExt;

use crate::Result;
use crate::projection::Projection;

/// Processes events from an event store and delivers them to projections.
///
/// The processor supports:
/// - Catch-up: replays all events from the store to bring projections up to date
/// - Single event delivery: delivers a new event to all projections
/// - Rebuild: resets all projections and replays from scratch
///
/// It also implements [`EventPublisher`], so command services can hand it
/// freshly appended events directly. A failing projection is logged and
/// skipped rather than blocking the feed: projections are rebuildable, and
/// the write path must never stall on them.
pub struct ProjectionProcessor<S: EventStore> {
    store: S,
    projections: Vec<Box<dyn Projection>>,
}

impl<S: EventStore> ProjectionProcessor<S> {
    /// Creates a new processor with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
        }
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    async fn deliver(&self, projection: &dyn Projection, event: &EventEnvelope) {
        match projection.handle(event).await {
            Ok(()) => {
                metrics::counter!("projections_events_processed").increment(1);
            }
            Err(e) => {
                tracing::warn!(
                    projection = projection.name(),
                    event_type = %event.event_type,
                    error = %e,
                    "projection failed to handle event"
                );
                metrics::counter!("projections_handler_failures").increment(1);
            }
        }
    }

    /// Runs catch-up processing: streams all events from the store and
    /// delivers them to each projection that hasn't already seen them.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<()> {
        let mut stream = self.store.stream_all_events().await?;
        let mut event_index: u64 = 0;

        while let Some(result) = stream.next().await {
            let event = result?;
            event_index += 1;

            for projection in &self.projections {
                let pos = projection.position().await;
                if pos.events_processed < event_index {
                    self.deliver(projection.as_ref(), &event).await;
                }
            }
        }

        tracing::info!(events_processed = event_index, "catch-up complete");

        Ok(())
    }

    /// Delivers a single event to all registered projections.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn process_event(&self, event: &EventEnvelope) -> Result<()> {
        for projection in &self.projections {
            self.deliver(projection.as_ref(), event).await;
        }
        Ok(())
    }

    /// Resets all projections and replays all events from the store.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.run_catch_up().await
    }
}

#[async_trait]
impl<S: EventStore> EventPublisher for ProjectionProcessor<S> {
    async fn publish(&self, events: &[EventEnvelope]) -> event_store::Result<()> {
        for event in events {
            self.process_event(event)
                .await
                .map_err(|e| event_store::EventStoreError::Publish(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionPosition;
    use async_trait::async_trait;
    use common::{AggregateId, TenantId};
    use event_store::{InMemoryEventStore, Version};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// A simple counting projection for testing.
    struct CountingProjection {
        count: Arc<RwLock<u64>>,
        position: Arc<RwLock<ProjectionPosition>>,
        fail: bool,
    }

    impl CountingProjection {
        fn new() -> Self {
            Self {
                count: Arc::new(RwLock::new(0)),
                position: Arc::new(RwLock::new(ProjectionPosition::zero())),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl Projection for CountingProjection {
        fn name(&self) -> &'static str {
            "CountingProjection"
        }

        async fn handle(&self, _event: &EventEnvelope) -> Result<()> {
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            if self.fail {
                return Err(crate::ProjectionError::Projection(
                    "simulated failure".to_string(),
                ));
            }
            let mut count = self.count.write().await;
            *count += 1;
            Ok(())
        }

        async fn position(&self) -> ProjectionPosition {
            *self.position.read().await
        }

        async fn reset(&self) -> Result<()> {
            *self.count.write().await = 0;
            *self.position.write().await = ProjectionPosition::zero();
            Ok(())
        }
    }

    fn create_test_event(tenant_id: TenantId, aggregate_id: AggregateId, version: i64) -> EventEnvelope {
        EventEnvelope::builder()
            .tenant_id(tenant_id)
            .aggregate_id(aggregate_id)
            .aggregate_type("Invoice")
            .event_type("TestEvent")
            .version(Version::new(version))
            .payload_raw(serde_json::json!({"test": true}))
            .build()
    }

    async fn seed(store: &InMemoryEventStore, count: i64) {
        let tenant_id = TenantId::new();
        let aggregate_id = AggregateId::new();
        let events: Vec<_> = (1..=count)
            .map(|v| create_test_event(tenant_id, aggregate_id, v))
            .collect();
        store
            .append(events, event_store::AppendOptions::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn catch_up_processes_all_events() {
        let store = InMemoryEventStore::new();
        seed(&store, 3).await;

        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);
        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));

        processor.run_catch_up().await.unwrap();

        assert_eq!(*count_ref.read().await, 3);
    }

    #[tokio::test]
    async fn process_single_event() {
        let store = InMemoryEventStore::new();
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));

        let event = create_test_event(TenantId::new(), AggregateId::new(), 1);
        processor.process_event(&event).await.unwrap();

        assert_eq!(*count_ref.read().await, 1);
    }

    #[tokio::test]
    async fn publish_feeds_projections() {
        let store = InMemoryEventStore::new();
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));

        let events = vec![
            create_test_event(TenantId::new(), AggregateId::new(), 1),
            create_test_event(TenantId::new(), AggregateId::new(), 1),
        ];
        EventPublisher::publish(&processor, &events).await.unwrap();

        assert_eq!(*count_ref.read().await, 2);
    }

    #[tokio::test]
    async fn rebuild_resets_and_replays() {
        let store = InMemoryEventStore::new();
        seed(&store, 2).await;

        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);
        let pos_ref = Arc::clone(&projection.position);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));

        processor.run_catch_up().await.unwrap();
        assert_eq!(*count_ref.read().await, 2);

        processor.rebuild_all().await.unwrap();
        assert_eq!(*count_ref.read().await, 2);
        assert_eq!(pos_ref.read().await.events_processed, 2);
    }

    #[tokio::test]
    async fn catch_up_skips_already_processed() {
        let store = InMemoryEventStore::new();
        seed(&store, 3).await;

        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));

        processor.run_catch_up().await.unwrap();
        assert_eq!(*count_ref.read().await, 3);

        processor.run_catch_up().await.unwrap();
        assert_eq!(*count_ref.read().await, 3);
    }

    #[tokio::test]
    async fn empty_store_catch_up() {
        let store = InMemoryEventStore::new();
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));

        processor.run_catch_up().await.unwrap();
        assert_eq!(*count_ref.read().await, 0);
    }

    #[tokio::test]
    async fn one_stuck_projection_does_not_block_the_others() {
        let store = InMemoryEventStore::new();
        seed(&store, 2).await;

        let healthy = CountingProjection::new();
        let healthy_count = Arc::clone(&healthy.count);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(CountingProjection::failing()));
        processor.register(Box::new(healthy));

        processor.run_catch_up().await.unwrap();

        assert_eq!(*healthy_count.read().await, 2);
    }

    #[tokio::test]
    async fn multiple_projections() {
        let store = InMemoryEventStore::new();
        seed(&store, 2).await;

        let proj1 = CountingProjection::new();
        let proj2 = CountingProjection::new();
        let count1 = Arc::clone(&proj1.count);
        let count2 = Arc::clone(&proj2.count);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(proj1));
        processor.register(Box::new(proj2));

        processor.run_catch_up().await.unwrap();

        assert_eq!(*count1.read().await, 2);
        assert_eq!(*count2.read().await, 2);
    }
}
