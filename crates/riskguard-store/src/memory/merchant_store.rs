use async_trait::async_trait;
use chrono::{DateTime, Utc};
use riskguard_types::{MerchantCategoryFrequency, RiskGuardResult};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::MerchantFrequencyStore;

#[derive(Default)]
pub struct InMemoryMerchantFrequencyStore {
    rows: RwLock<HashMap<String, MerchantCategoryFrequency>>,
}

impl InMemoryMerchantFrequencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MerchantFrequencyStore for InMemoryMerchantFrequencyStore {
    async fn get(&self, user_id: &str) -> RiskGuardResult<Option<MerchantCategoryFrequency>> {
        let rows = self.rows.read().await;
        Ok(rows.get(user_id).cloned())
    }

    async fn increment(
        &self,
        user_id: &str,
        category: &str,
        now: DateTime<Utc>,
    ) -> RiskGuardResult<MerchantCategoryFrequency> {
        let mut rows = self.rows.write().await;
        let entry = rows
            .entry(user_id.to_string())
            .or_insert_with(|| MerchantCategoryFrequency::empty(user_id, now));
        entry.increment(category, now);
        Ok(entry.clone())
    }
}
