use async_trait::async_trait;
use riskguard_types::{RiskGuardResult, RiskProfile};

/// Durable store of immutable per-user `RiskProfile` snapshots. Mutation is
/// always full replacement, never a field-level update.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: &str) -> RiskGuardResult<Option<RiskProfile>>;

    async fn upsert(&self, profile: RiskProfile) -> RiskGuardResult<()>;
}
