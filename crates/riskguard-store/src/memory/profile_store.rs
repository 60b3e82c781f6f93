use async_trait::async_trait;
use riskguard_types::{RiskGuardResult, RiskProfile};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::ProfileStore;

#[derive(Default)]
pub struct InMemoryProfileStore {
    rows: RwLock<HashMap<String, RiskProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get(&self, user_id: &str) -> RiskGuardResult<Option<RiskProfile>> {
        let rows = self.rows.read().await;
        Ok(rows.get(user_id).cloned())
    }

    async fn upsert(&self, profile: RiskProfile) -> RiskGuardResult<()> {
        let mut rows = self.rows.write().await;
        rows.insert(profile.user_id.clone(), profile);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn get_missing_user_is_none() {
        let store = InMemoryProfileStore::new();
        assert!(store.get("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_whole_snapshot() {
        let store = InMemoryProfileStore::new();
        let mut profile = RiskProfile::initial("u1", Utc::now());
        store.upsert(profile.clone()).await.unwrap();
        profile.total_transactions = 5;
        store.upsert(profile).await.unwrap();
        let fetched = store.get("u1").await.unwrap().unwrap();
        assert_eq!(fetched.total_transactions, 5);
    }
}
