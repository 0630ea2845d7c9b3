use thiserror::Error;

use crate::{StreamId, Version};

/// Errors that can occur when interacting with the event store.
///
/// `ConcurrencyConflict` and `InvalidAppend` are rejections the caller can
/// act on directly; `Database` and `Migration` are infrastructure failures
/// that callers may retry with backoff.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// A concurrency conflict occurred when appending events.
    /// The expected version did not match the actual version.
    #[error(
        "Concurrency conflict on stream {stream_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        stream_id: StreamId,
        expected: Version,
        actual: Version,
    },

    /// The stream was not found in the event store.
    #[error("Stream not found: {0}")]
    StreamNotFound(StreamId),

    /// The batch of events handed to `append` was malformed.
    #[error("Invalid append: {0}")]
    InvalidAppend(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Delivering appended events to a subscriber failed.
    #[error("Publish error: {0}")]
    Publish(String),
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
