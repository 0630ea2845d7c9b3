use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{AggregateId, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EventId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<EventId> for Uuid {
    fn from(id: EventId) -> Self {
        id.0
    }
}

/// Position of an event within its stream, used for optimistic concurrency
/// control.
///
/// Versions start at 1 for the first event and increment by 1 for each
/// subsequent event on a stream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) for a stream with no events.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the first version (1) for the first event.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// Tenant-namespaced stream name.
///
/// Streams are named `tenant-{tenantId}-{aggregateType}-{aggregateId}` so
/// that streams belonging to different tenants can never collide, even for
/// the same aggregate ID. The only way to obtain a `StreamId` is through
/// [`StreamId::build`], which forces every caller to present a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    /// Builds the stream name for an aggregate within a tenant.
    pub fn build(tenant_id: TenantId, aggregate_type: &str, aggregate_id: AggregateId) -> Self {
        Self(format!(
            "tenant-{tenant_id}-{}-{aggregate_id}",
            aggregate_type.to_ascii_lowercase()
        ))
    }

    /// Returns the stream name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reconstructs a stream ID from its stored string form.
    ///
    /// Intended for persistence layers reading back previously built names;
    /// it performs no validation.
    pub fn from_stored(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for StreamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An event envelope containing a domain event along with its metadata.
///
/// This structure wraps a domain event with all the information needed
/// for storage, retrieval, and tenant-scoped routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique identifier for this event.
    pub event_id: EventId,

    /// The type of the event (e.g., "InvoiceCreated", "PaymentCompleted").
    pub event_type: String,

    /// The tenant-namespaced stream this event was appended to.
    pub stream_id: StreamId,

    /// The aggregate this event belongs to.
    pub aggregate_id: AggregateId,

    /// The type of aggregate (e.g., "Invoice", "Payment").
    pub aggregate_type: String,

    /// The tenant that owns the aggregate.
    pub tenant_id: TenantId,

    /// The version of the stream after this event.
    pub version: Version,

    /// Schema version of the event payload, for upcasting old events.
    pub schema_version: u16,

    /// When the event was created.
    pub timestamp: DateTime<Utc>,

    /// The event payload as JSON.
    pub payload: serde_json::Value,

    /// Additional metadata about the event.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl EventEnvelope {
    /// Creates a new event envelope builder.
    pub fn builder() -> EventEnvelopeBuilder {
        EventEnvelopeBuilder::default()
    }
}

/// Builder for constructing event envelopes.
///
/// The stream ID is derived from the tenant, aggregate type, and aggregate
/// ID at build time; callers never assemble stream names by hand.
#[derive(Debug, Default)]
pub struct EventEnvelopeBuilder {
    event_id: Option<EventId>,
    event_type: Option<String>,
    aggregate_id: Option<AggregateId>,
    aggregate_type: Option<String>,
    tenant_id: Option<TenantId>,
    version: Option<Version>,
    schema_version: Option<u16>,
    timestamp: Option<DateTime<Utc>>,
    payload: Option<serde_json::Value>,
    metadata: HashMap<String, serde_json::Value>,
}

impl EventEnvelopeBuilder {
    /// Sets the event ID. If not set, a new ID will be generated.
    pub fn event_id(mut self, id: EventId) -> Self {
        self.event_id = Some(id);
        self
    }

    /// Sets the event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Sets the aggregate ID.
    pub fn aggregate_id(mut self, id: AggregateId) -> Self {
        self.aggregate_id = Some(id);
        self
    }

    /// Sets the aggregate type.
    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    /// Sets the owning tenant.
    pub fn tenant_id(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Sets the stream version.
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the payload schema version. Defaults to 1.
    pub fn schema_version(mut self, schema_version: u16) -> Self {
        self.schema_version = Some(schema_version);
        self
    }

    /// Sets the timestamp. If not set, the current time will be used.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Adds a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builds the event envelope.
    ///
    /// # Panics
    ///
    /// Panics if required fields (event_type, aggregate_id, aggregate_type,
    /// tenant_id, version, payload) are not set.
    pub fn build(self) -> EventEnvelope {
        let aggregate_id = self.aggregate_id.expect("aggregate_id is required");
        let aggregate_type = self.aggregate_type.expect("aggregate_type is required");
        let tenant_id = self.tenant_id.expect("tenant_id is required");
        let stream_id = StreamId::build(tenant_id, &aggregate_type, aggregate_id);

        EventEnvelope {
            event_id: self.event_id.unwrap_or_default(),
            event_type: self.event_type.expect("event_type is required"),
            stream_id,
            aggregate_id,
            aggregate_type,
            tenant_id,
            version: self.version.expect("version is required"),
            schema_version: self.schema_version.unwrap_or(1),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            payload: self.payload.expect("payload is required"),
            metadata: self.metadata,
        }
    }

    /// Tries to build the event envelope, returning None if required fields
    /// are missing.
    pub fn try_build(self) -> Option<EventEnvelope> {
        let aggregate_id = self.aggregate_id?;
        let aggregate_type = self.aggregate_type?;
        let tenant_id = self.tenant_id?;
        let stream_id = StreamId::build(tenant_id, &aggregate_type, aggregate_id);

        Some(EventEnvelope {
            event_id: self.event_id.unwrap_or_default(),
            event_type: self.event_type?,
            stream_id,
            aggregate_id,
            aggregate_type,
            tenant_id,
            version: self.version?,
            schema_version: self.schema_version.unwrap_or(1),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            payload: self.payload?,
            metadata: self.metadata,
        })
    }
}
