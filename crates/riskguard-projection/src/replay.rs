use chrono::{DateTime, Utc};
use futures::future::join_all;
use riskguard_store::{EventLogStore, ProfileStore};
use riskguard_types::{AggregateType, EventType, RiskGuardError, RiskGuardResult, RiskProfile};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::projection::ProfileProjection;

/// Rebuilds profiles from the event log: live, as-of-timestamp,
/// incremental-since, or full-system. The single invariant this validates is
/// that `replay(u)` always agrees with what the live workflow would have
/// produced from the same events.
pub struct ReplayService {
    event_log: Arc<dyn EventLogStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl ReplayService {
    pub fn new(event_log: Arc<dyn EventLogStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { event_log, profiles }
    }

    #[instrument(skip(self))]
    pub async fn replay(&self, user_id: &str) -> RiskGuardResult<RiskProfile> {
        let events = self.event_log.by_aggregate(user_id, AggregateType::User).await?;
        let profile = ProfileProjection::build(user_id, events, Utc::now());
        self.profiles.upsert(profile.clone()).await?;
        Ok(profile)
    }

    /// Time-travel is read-only: the projection is returned but never
    /// persisted.
    #[instrument(skip(self))]
    pub async fn replay_as_of(&self, user_id: &str, as_of: DateTime<Utc>) -> RiskGuardResult<RiskProfile> {
        let events = self
            .event_log
            .by_aggregate_as_of(user_id, AggregateType::User, as_of)
            .await?;
        Ok(ProfileProjection::build(user_id, events, as_of))
    }

    #[instrument(skip(self))]
    pub async fn replay_incremental_since(
        &self,
        since: DateTime<Utc>,
        batch_size: usize,
    ) -> RiskGuardResult<usize> {
        let max_sequence = self.event_log.max_sequence().await?;
        let mut updated_users = 0usize;
        let mut by_user: BTreeMap<String, Vec<riskguard_types::EventLogEntry>> = BTreeMap::new();

        let mut start = 1i64;
        while start <= max_sequence {
            let end = (start + batch_size as i64 - 1).min(max_sequence);
            let batch = self.event_log.in_range(start, end).await?;
            for event in batch {
                if event.created_at > since && event.aggregate_type == AggregateType::User {
                    by_user.entry(event.aggregate_id.clone()).or_default().push(event);
                }
            }
            info!(start, end, "replay_incremental_since processed batch");
            start = end + 1;
        }

        // Per-aggregate groups are independent, so they fold and upsert
        // concurrently, chunked to batch_size to bound the fan-out.
        let groups: Vec<(String, Vec<riskguard_types::EventLogEntry>)> = by_user.into_iter().collect();
        for chunk in groups.chunks(batch_size.max(1)) {
            let futures = chunk.iter().map(|(user_id, events)| {
                let profiles = self.profiles.clone();
                let user_id = user_id.clone();
                let events = events.clone();
                async move {
                    let existing = profiles
                        .get(&user_id)
                        .await?
                        .unwrap_or_else(|| RiskProfile::initial(&user_id, since));
                    let updated = ProfileProjection::apply(existing, events);
                    profiles.upsert(updated).await?;
                    RiskGuardResult::Ok(())
                }
            });
            for result in join_all(futures).await {
                result?;
                updated_users += 1;
            }
        }

        Ok(updated_users)
    }

    #[instrument(skip(self))]
    pub async fn replay_all(&self, batch_size: usize) -> RiskGuardResult<usize> {
        let max_sequence = self.event_log.max_sequence().await?;
        let mut by_user: BTreeMap<String, Vec<riskguard_types::EventLogEntry>> = BTreeMap::new();
        let relevant = [
            EventType::TransactionCreated,
            EventType::FraudDetected,
            EventType::FraudCleared,
        ];

        let mut start = 1i64;
        while start <= max_sequence {
            let end = (start + batch_size as i64 - 1).min(max_sequence);
            let batch = self.event_log.in_range(start, end).await?;
            for event in batch {
                if event.aggregate_type == AggregateType::User && relevant.contains(&event.event_type) {
                    by_user.entry(event.aggregate_id.clone()).or_default().push(event);
                }
            }
            info!(start, end, "replay_all processed batch");
            start = end + 1;
        }

        let mut updated_users = 0usize;
        let groups: Vec<(String, Vec<riskguard_types::EventLogEntry>)> = by_user.into_iter().collect();
        for chunk in groups.chunks(batch_size.max(1)) {
            let futures = chunk.iter().map(|(user_id, events)| {
                let profiles = self.profiles.clone();
                let user_id = user_id.clone();
                let events = events.clone();
                async move {
                    let profile = ProfileProjection::build(&user_id, events, Utc::now());
                    profiles.upsert(profile).await?;
                    RiskGuardResult::Ok(())
                }
            });
            for result in join_all(futures).await {
                result?;
                updated_users += 1;
            }
        }
        Ok(updated_users)
    }
}

pub fn validate_as_of(as_of: DateTime<Utc>, now: DateTime<Utc>) -> RiskGuardResult<()> {
    if as_of > now {
        return Err(RiskGuardError::ReplayInput(format!(
            "as-of timestamp {as_of} is in the future"
        )));
    }
    Ok(())
}
