use async_trait::async_trait;
use chrono::{DateTime, Utc};
use riskguard_types::{AggregateType, EventLogEntry, EventType, RiskGuardResult};
use serde_json::Value;
use std::collections::HashMap;

/// Append-only ordered log of domain events keyed by a monotonically
/// increasing `sequence_number`.
#[async_trait]
pub trait EventLogStore: Send + Sync {
    /// Allocates the next sequence number atomically, sets `event_id`,
    /// `version = 1`, and persists. `created_at` is the caller-supplied
    /// domain timestamp the event is recorded against (e.g. the
    /// transaction's own `created_at`), not append wall-time — as-of replay
    /// (`by_aggregate_as_of`) filters on this field, so it must reflect when
    /// the event logically happened, not when the log write committed. No
    /// partial writes: on failure the caller sees `RiskGuardError::Storage`
    /// and nothing is appended.
    async fn append(
        &self,
        event_type: EventType,
        aggregate_id: &str,
        aggregate_type: AggregateType,
        payload: Value,
        metadata: HashMap<String, String>,
        created_at: DateTime<Utc>,
    ) -> RiskGuardResult<EventLogEntry>;

    /// Ordered ascending by `sequence_number`.
    async fn by_aggregate(&self, id: &str, aggregate_type: AggregateType) -> RiskGuardResult<Vec<EventLogEntry>>;

    /// Same as `by_aggregate`, restricted to `created_at <= as_of`.
    async fn by_aggregate_as_of(
        &self,
        id: &str,
        aggregate_type: AggregateType,
        as_of: DateTime<Utc>,
    ) -> RiskGuardResult<Vec<EventLogEntry>>;

    /// Ordered descending by `created_at`.
    async fn by_type(&self, event_type: EventType) -> RiskGuardResult<Vec<EventLogEntry>>;

    /// Ordered ascending by `sequence_number`, `start..=end` inclusive.
    async fn in_range(&self, start: i64, end: i64) -> RiskGuardResult<Vec<EventLogEntry>>;

    async fn max_sequence(&self) -> RiskGuardResult<i64>;

    async fn count_by_type(&self, event_type: EventType) -> RiskGuardResult<i64>;
}
