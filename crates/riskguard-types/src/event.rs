//! Event log entry model: the immutable append-only record every aggregate
//! state change is derived from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregateType {
    User,
    Transaction,
}

/// The six event types that are ever appended to the log. Evaluation
/// failures are logged, not stored as events — see `RiskGuardError::Evaluation`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    TransactionCreated,
    FraudDetected,
    FraudCleared,
    TransactionBlocked,
    UserProfileUpdated,
    HighRiskUserIdentified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub event_id: Uuid,
    pub event_type: EventType,
    pub aggregate_id: String,
    pub aggregate_type: AggregateType,
    pub event_data: Value,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub sequence_number: i64,
    pub version: i32,
}

impl EventLogEntry {
    /// Construct a new entry; `sequence_number` is assigned by the store on
    /// append, so this is a zero value that the store is responsible for
    /// overwriting before persistence.
    pub fn new(
        event_type: EventType,
        aggregate_id: impl Into<String>,
        aggregate_type: AggregateType,
        event_data: Value,
        metadata: HashMap<String, String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            aggregate_id: aggregate_id.into(),
            aggregate_type,
            event_data,
            metadata,
            created_at,
            sequence_number: 0,
            version: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_has_unassigned_sequence() {
        let entry = EventLogEntry::new(
            EventType::TransactionCreated,
            "u1",
            AggregateType::User,
            Value::Null,
            HashMap::new(),
            Utc::now(),
        );
        assert_eq!(entry.sequence_number, 0);
        assert_eq!(entry.version, 1);
    }
}
