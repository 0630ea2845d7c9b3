//! Command handling infrastructure.

use std::marker::PhantomData;
use std::sync::Arc;

use common::{AggregateId, TenantId};
use event_store::{
    AppendOptions, EventEnvelope, EventPublisher, EventStore, EventStoreExt, NullPublisher,
    Snapshot, StreamId, Version,
};
use serde::Serialize;

use crate::aggregate::{Aggregate, DomainEvent, SnapshotCapable};
use crate::error::DomainError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    /// The new version of the aggregate after the command.
    pub new_version: Version,
}

/// Trait for commands that can be executed against an aggregate.
///
/// Commands represent an intention to perform an action. They may be rejected
/// if the aggregate's current state doesn't allow the action. Every command
/// carries the tenant it acts for; the handler refuses to act without one.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> AggregateId;

    /// Returns the tenant this command acts for.
    fn tenant_id(&self) -> TenantId;
}

/// Handler for executing commands against aggregates.
///
/// The handler is responsible for:
/// 1. Loading the aggregate from the event store (with optional snapshot)
/// 2. Executing the command to produce events
/// 3. Persisting the events with the loaded version as the expected version
/// 4. Publishing the persisted events to the injected publisher
/// 5. Optionally saving a snapshot
///
/// A `ConcurrencyConflict` from the append is surfaced to the caller; the
/// handler never retries on its own, since retry safety depends on
/// caller-level idempotency.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    publisher: Arc<dyn EventPublisher>,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    /// Creates a new command handler with the given event store and no
    /// read-side publisher.
    pub fn new(store: S) -> Self {
        Self {
            store,
            publisher: Arc::new(NullPublisher),
            _phantom: PhantomData,
        }
    }

    /// Sets the publisher that receives events after a successful append.
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn stream_id(tenant_id: TenantId, aggregate_id: AggregateId) -> StreamId {
        StreamId::build(tenant_id, A::aggregate_type(), aggregate_id)
    }

    /// Loads an aggregate from its tenant-scoped stream.
    ///
    /// If the aggregate doesn't exist, returns a default instance. Every
    /// loaded event's tenant tag is checked against the requested tenant.
    pub async fn load(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
    ) -> Result<A, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de>,
    {
        let stream_id = Self::stream_id(tenant_id, aggregate_id);
        let (snapshot, events) = self.store.load_stream(&stream_id).await?;

        let mut aggregate = if let Some(snapshot) = snapshot {
            if snapshot.tenant_id != tenant_id {
                return Err(DomainError::TenantMismatch {
                    requested: tenant_id,
                    found: snapshot.tenant_id,
                });
            }
            self.restore_from_snapshot(snapshot)?
        } else {
            A::default()
        };

        // Apply events after snapshot
        for envelope in events {
            if envelope.tenant_id != tenant_id {
                return Err(DomainError::TenantMismatch {
                    requested: tenant_id,
                    found: envelope.tenant_id,
                });
            }
            let event: A::Event = serde_json::from_value(envelope.payload)?;
            aggregate.apply(event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
    ) -> Result<Option<A>, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de>,
    {
        let aggregate = self.load(tenant_id, aggregate_id).await?;
        if aggregate.id().is_some() {
            Ok(Some(aggregate))
        } else {
            Ok(None)
        }
    }

    /// Executes a command and persists the resulting events.
    ///
    /// The command function receives the current aggregate state and returns
    /// either a list of events to apply, or an error. The whole batch is
    /// appended in one call with one expected version, so multi-event
    /// decisions (e.g. a payment that also settles the invoice) commit
    /// atomically with no observable intermediate state.
    pub async fn execute<F>(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de> + Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(tenant_id, aggregate_id).await?;
        let current_version = aggregate.version();

        // Execute command to get events
        let events = command_fn(&aggregate)?;

        if events.is_empty() {
            // Idempotent no-op: nothing persisted, nothing published.
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                new_version: current_version,
            });
        }

        // Build envelopes for persistence
        let envelopes = self.build_envelopes(tenant_id, aggregate_id, current_version, &events)?;

        // Persist events with optimistic concurrency
        let options = if current_version == Version::initial() {
            AppendOptions::expect_new()
        } else {
            AppendOptions::expect_version(current_version)
        };

        let new_version = self.store.append(envelopes.clone(), options).await?;
        metrics::counter!("domain_commands_executed").increment(1);

        // Deliver to the read side. Projections are rebuildable, so a
        // publish failure must not fail the already-durable command.
        if let Err(e) = self.publisher.publish(&envelopes).await {
            tracing::warn!(error = %e, aggregate_id = %aggregate_id, "event publication failed");
            metrics::counter!("domain_publish_failures").increment(1);
        }

        // Apply events to aggregate
        for event in &events {
            aggregate.apply(event.clone());
        }
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Builds event envelopes from domain events.
    fn build_envelopes(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError>
    where
        A::Event: Serialize,
    {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;

        for event in events {
            version = version.next();
            let envelope = EventEnvelope::builder()
                .tenant_id(tenant_id)
                .aggregate_id(aggregate_id)
                .aggregate_type(A::aggregate_type())
                .event_type(event.event_type())
                .version(version)
                .payload(event)?
                .build();
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }

    fn restore_from_snapshot(&self, snapshot: Snapshot) -> Result<A, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
    {
        let aggregate: A = serde_json::from_value(snapshot.state)?;
        Ok(aggregate)
    }
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: SnapshotCapable,
{
    /// Executes a command and optionally saves a snapshot.
    pub async fn execute_with_snapshot<F>(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de> + Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let result = self.execute(tenant_id, aggregate_id, command_fn).await?;

        // Save snapshot if needed
        if result.aggregate.should_snapshot() {
            let snapshot = Snapshot::from_state(
                tenant_id,
                aggregate_id,
                A::aggregate_type(),
                result.new_version,
                &result.aggregate,
            )?;
            self.store.save_snapshot(snapshot).await?;
        }

        Ok(result)
    }
}
