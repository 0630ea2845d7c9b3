use chrono::{DateTime, Utc};
use common::{AggregateId, TenantId};
use serde::{Deserialize, Serialize};

use crate::{StreamId, Version};

/// A snapshot of an aggregate's state at a specific version.
///
/// Snapshots are used to optimize aggregate reconstruction by providing
/// a starting point, avoiding the need to replay all events from the
/// beginning. Snapshots are keyed by stream, so they inherit the stream's
/// tenant namespacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The stream this snapshot belongs to.
    pub stream_id: StreamId,

    /// The aggregate captured by this snapshot.
    pub aggregate_id: AggregateId,

    /// The type of aggregate (e.g., "Invoice", "Payment").
    pub aggregate_type: String,

    /// The tenant that owns the aggregate.
    pub tenant_id: TenantId,

    /// The stream version at the time of the snapshot.
    pub version: Version,

    /// When the snapshot was created.
    pub timestamp: DateTime<Utc>,

    /// The serialized aggregate state.
    pub state: serde_json::Value,
}

impl Snapshot {
    /// Creates a new snapshot.
    pub fn new(
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        version: Version,
        state: serde_json::Value,
    ) -> Self {
        let aggregate_type = aggregate_type.into();
        Self {
            stream_id: StreamId::build(tenant_id, &aggregate_type, aggregate_id),
            aggregate_id,
            aggregate_type,
            tenant_id,
            version,
            timestamp: Utc::now(),
            state,
        }
    }

    /// Creates a snapshot from a serializable state.
    pub fn from_state<T: Serialize>(
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        version: Version,
        state: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            tenant_id,
            aggregate_id,
            aggregate_type,
            version,
            serde_json::to_value(state)?,
        ))
    }

    /// Deserializes the snapshot state into a concrete type.
    pub fn into_state<T: for<'de> Deserialize<'de>>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.state)
    }

    /// Gets a reference to the state as JSON.
    pub fn state_ref(&self) -> &serde_json::Value {
        &self.state
    }
}
