use async_trait::async_trait;
use chrono::{DateTime, Utc};
use riskguard_types::{MerchantCategoryFrequency, RiskGuardError, RiskGuardResult};
use sqlx::{FromRow, PgPool};
use serde_json::Value;

use crate::MerchantFrequencyStore;

pub struct PostgresMerchantFrequencyStore {
    pool: PgPool,
}

impl PostgresMerchantFrequencyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct MerchantFrequencyRow {
    user_id: String,
    category_frequencies: Value,
    last_updated: DateTime<Utc>,
}

impl MerchantFrequencyRow {
    fn into_frequency(self) -> RiskGuardResult<MerchantCategoryFrequency> {
        let category_frequencies = serde_json::from_value(self.category_frequencies)
            .map_err(|e| RiskGuardError::Storage(format!("category_frequencies decode failed: {e}")))?;
        Ok(MerchantCategoryFrequency {
            user_id: self.user_id,
            category_frequencies,
            last_updated: self.last_updated,
        })
    }
}

#[async_trait]
impl MerchantFrequencyStore for PostgresMerchantFrequencyStore {
    async fn get(&self, user_id: &str) -> RiskGuardResult<Option<MerchantCategoryFrequency>> {
        let row: Option<MerchantFrequencyRow> =
            sqlx::query_as("SELECT * FROM merchant_category_frequency WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        row.map(MerchantFrequencyRow::into_frequency).transpose()
    }

    async fn increment(
        &self,
        user_id: &str,
        category: &str,
        now: DateTime<Utc>,
    ) -> RiskGuardResult<MerchantCategoryFrequency> {
        let mut current = self
            .get(user_id)
            .await?
            .unwrap_or_else(|| MerchantCategoryFrequency::empty(user_id, now));
        current.increment(category, now);

        let json = serde_json::to_value(&current.category_frequencies)
            .map_err(|e| RiskGuardError::Storage(format!("category_frequencies encode failed: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO merchant_category_frequency (user_id, category_frequencies, last_updated)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                category_frequencies = EXCLUDED.category_frequencies,
                last_updated = EXCLUDED.last_updated
            "#,
        )
        .bind(user_id)
        .bind(&json)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;

        Ok(current)
    }
}
