use async_trait::async_trait;
use chrono::{DateTime, Utc};
use riskguard_types::{AggregateType, EventLogEntry, EventType, RiskGuardResult};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::EventLogStore;

#[derive(Default)]
pub struct InMemoryEventLogStore {
    rows: RwLock<Vec<EventLogEntry>>,
}

impl InMemoryEventLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventLogStore for InMemoryEventLogStore {
    async fn append(
        &self,
        event_type: EventType,
        aggregate_id: &str,
        aggregate_type: AggregateType,
        payload: Value,
        metadata: HashMap<String, String>,
        created_at: DateTime<Utc>,
    ) -> RiskGuardResult<EventLogEntry> {
        let mut rows = self.rows.write().await;
        let next_sequence = rows.last().map(|e| e.sequence_number + 1).unwrap_or(1);
        let mut entry = EventLogEntry::new(
            event_type,
            aggregate_id,
            aggregate_type,
            payload,
            metadata,
            created_at,
        );
        entry.sequence_number = next_sequence;
        rows.push(entry.clone());
        Ok(entry)
    }

    async fn by_aggregate(&self, id: &str, aggregate_type: AggregateType) -> RiskGuardResult<Vec<EventLogEntry>> {
        let rows = self.rows.read().await;
        let mut matched: Vec<EventLogEntry> = rows
            .iter()
            .filter(|e| e.aggregate_id == id && e.aggregate_type == aggregate_type)
            .cloned()
            .collect();
        matched.sort_by_key(|e| e.sequence_number);
        Ok(matched)
    }

    async fn by_aggregate_as_of(
        &self,
        id: &str,
        aggregate_type: AggregateType,
        as_of: DateTime<Utc>,
    ) -> RiskGuardResult<Vec<EventLogEntry>> {
        let events = self.by_aggregate(id, aggregate_type).await?;
        Ok(events.into_iter().filter(|e| e.created_at <= as_of).collect())
    }

    async fn by_type(&self, event_type: EventType) -> RiskGuardResult<Vec<EventLogEntry>> {
        let rows = self.rows.read().await;
        let mut matched: Vec<EventLogEntry> = rows
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn in_range(&self, start: i64, end: i64) -> RiskGuardResult<Vec<EventLogEntry>> {
        let rows = self.rows.read().await;
        let mut matched: Vec<EventLogEntry> = rows
            .iter()
            .filter(|e| e.sequence_number >= start && e.sequence_number <= end)
            .cloned()
            .collect();
        matched.sort_by_key(|e| e.sequence_number);
        Ok(matched)
    }

    async fn max_sequence(&self) -> RiskGuardResult<i64> {
        let rows = self.rows.read().await;
        Ok(rows.last().map(|e| e.sequence_number).unwrap_or(0))
    }

    async fn count_by_type(&self, event_type: EventType) -> RiskGuardResult<i64> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|e| e.event_type == event_type).count() as i64)
    }
}
