//! Shared primitive aliases used across all event families.

/// Server-assigned row identifier; monotonically increasing per table.
pub type EventId = i64;

/// All timestamps are UTC and server-assigned.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque structured attributes attached to an event. The core stores and
/// returns this verbatim and never inspects it. Key order is irrelevant;
/// keys are unique per entry.
pub type Metadata = serde_json::Map<String, serde_json::Value>;
