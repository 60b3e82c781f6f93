use async_trait::async_trait;
use chrono::{DateTime, Utc};
use riskguard_types::{MerchantCategoryFrequency, RiskGuardResult};

/// Per-user mapping from merchant category to transaction count.
#[async_trait]
pub trait MerchantFrequencyStore: Send + Sync {
    async fn get(&self, user_id: &str) -> RiskGuardResult<Option<MerchantCategoryFrequency>>;

    /// Increment-by-one for `category`, creating an empty frequency map for
    /// the user first if none exists yet. Returns the updated frequency.
    async fn increment(
        &self,
        user_id: &str,
        category: &str,
        now: DateTime<Utc>,
    ) -> RiskGuardResult<MerchantCategoryFrequency>;
}
