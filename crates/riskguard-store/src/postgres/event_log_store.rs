use async_trait::async_trait;
use chrono::{DateTime, Utc};
use riskguard_types::{AggregateType, EventLogEntry, EventType, RiskGuardError, RiskGuardResult};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::EventLogStore;

pub struct PostgresEventLogStore {
    pool: PgPool,
}

impl PostgresEventLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct EventRow {
    event_id: Uuid,
    event_type: String,
    aggregate_id: String,
    aggregate_type: String,
    event_data: Value,
    metadata: Value,
    created_at: DateTime<Utc>,
    sequence_number: i64,
    version: i32,
}

fn type_label(t: EventType) -> &'static str {
    match t {
        EventType::TransactionCreated => "TRANSACTION_CREATED",
        EventType::FraudDetected => "FRAUD_DETECTED",
        EventType::FraudCleared => "FRAUD_CLEARED",
        EventType::TransactionBlocked => "TRANSACTION_BLOCKED",
        EventType::UserProfileUpdated => "USER_PROFILE_UPDATED",
        EventType::HighRiskUserIdentified => "HIGH_RISK_USER_IDENTIFIED",
    }
}

fn parse_type(label: &str) -> RiskGuardResult<EventType> {
    Ok(match label {
        "TRANSACTION_CREATED" => EventType::TransactionCreated,
        "FRAUD_DETECTED" => EventType::FraudDetected,
        "FRAUD_CLEARED" => EventType::FraudCleared,
        "TRANSACTION_BLOCKED" => EventType::TransactionBlocked,
        "USER_PROFILE_UPDATED" => EventType::UserProfileUpdated,
        "HIGH_RISK_USER_IDENTIFIED" => EventType::HighRiskUserIdentified,
        other => return Err(RiskGuardError::Storage(format!("unknown event_type in row: {other}"))),
    })
}

fn aggregate_label(t: AggregateType) -> &'static str {
    match t {
        AggregateType::User => "USER",
        AggregateType::Transaction => "TRANSACTION",
    }
}

fn parse_aggregate(label: &str) -> RiskGuardResult<AggregateType> {
    Ok(match label {
        "USER" => AggregateType::User,
        "TRANSACTION" => AggregateType::Transaction,
        other => return Err(RiskGuardError::Storage(format!("unknown aggregate_type in row: {other}"))),
    })
}

impl EventRow {
    fn into_entry(self) -> RiskGuardResult<EventLogEntry> {
        let metadata: HashMap<String, String> = serde_json::from_value(self.metadata)
            .map_err(|e| RiskGuardError::Storage(format!("metadata decode failed: {e}")))?;
        Ok(EventLogEntry {
            event_id: self.event_id,
            event_type: parse_type(&self.event_type)?,
            aggregate_id: self.aggregate_id,
            aggregate_type: parse_aggregate(&self.aggregate_type)?,
            event_data: self.event_data,
            metadata,
            created_at: self.created_at,
            sequence_number: self.sequence_number,
            version: self.version,
        })
    }
}

#[async_trait]
impl EventLogStore for PostgresEventLogStore {
    async fn append(
        &self,
        event_type: EventType,
        aggregate_id: &str,
        aggregate_type: AggregateType,
        payload: Value,
        metadata: HashMap<String, String>,
        created_at: DateTime<Utc>,
    ) -> RiskGuardResult<EventLogEntry> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RiskGuardError::Storage(e.to_string()))?;

        // Transactional MAX(seq)+1, per the serialised-allocation contract.
        let next_sequence: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sequence_number), 0) + 1 FROM event_log",
        )
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;

        let event_id = Uuid::new_v4();
        let metadata_json = serde_json::to_value(&metadata)
            .map_err(|e| RiskGuardError::Storage(format!("metadata encode failed: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO event_log (
                event_id, event_type, aggregate_id, aggregate_type,
                event_data, metadata, created_at, sequence_number, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event_id)
        .bind(type_label(event_type))
        .bind(aggregate_id)
        .bind(aggregate_label(aggregate_type))
        .bind(&payload)
        .bind(&metadata_json)
        .bind(created_at)
        .bind(next_sequence)
        .bind(1_i32)
        .execute(&mut *tx)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;

        tx.commit().await.map_err(|e| RiskGuardError::Storage(e.to_string()))?;

        Ok(EventLogEntry {
            event_id,
            event_type,
            aggregate_id: aggregate_id.to_string(),
            aggregate_type,
            event_data: payload,
            metadata,
            created_at,
            sequence_number: next_sequence,
            version: 1,
        })
    }

    async fn by_aggregate(&self, id: &str, aggregate_type: AggregateType) -> RiskGuardResult<Vec<EventLogEntry>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT * FROM event_log WHERE aggregate_id = $1 AND aggregate_type = $2 ORDER BY sequence_number ASC",
        )
        .bind(id)
        .bind(aggregate_label(aggregate_type))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        rows.into_iter().map(EventRow::into_entry).collect()
    }

    async fn by_aggregate_as_of(
        &self,
        id: &str,
        aggregate_type: AggregateType,
        as_of: DateTime<Utc>,
    ) -> RiskGuardResult<Vec<EventLogEntry>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT * FROM event_log WHERE aggregate_id = $1 AND aggregate_type = $2 AND created_at <= $3 ORDER BY sequence_number ASC",
        )
        .bind(id)
        .bind(aggregate_label(aggregate_type))
        .bind(as_of)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        rows.into_iter().map(EventRow::into_entry).collect()
    }

    async fn by_type(&self, event_type: EventType) -> RiskGuardResult<Vec<EventLogEntry>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT * FROM event_log WHERE event_type = $1 ORDER BY created_at DESC",
        )
        .bind(type_label(event_type))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        rows.into_iter().map(EventRow::into_entry).collect()
    }

    async fn in_range(&self, start: i64, end: i64) -> RiskGuardResult<Vec<EventLogEntry>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT * FROM event_log WHERE sequence_number >= $1 AND sequence_number <= $2 ORDER BY sequence_number ASC",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        rows.into_iter().map(EventRow::into_entry).collect()
    }

    async fn max_sequence(&self) -> RiskGuardResult<i64> {
        let max: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(sequence_number), 0) FROM event_log")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        Ok(max)
    }

    async fn count_by_type(&self, event_type: EventType) -> RiskGuardResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM event_log WHERE event_type = $1")
            .bind(type_label(event_type))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        Ok(count)
    }
}
