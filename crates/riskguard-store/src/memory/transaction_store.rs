use async_trait::async_trait;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, Utc};
use riskguard_types::{RiskGuardError, RiskGuardResult, Transaction, TransactionRequest};
use std::str::FromStr;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::TransactionStore;

#[derive(Default)]
pub struct InMemoryTransactionStore {
    rows: RwLock<Vec<Transaction>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn save(&self, request: TransactionRequest) -> RiskGuardResult<Transaction> {
        request.validate()?;
        let tx = Transaction::from_request(request, Utc::now());
        let mut rows = self.rows.write().await;
        rows.push(tx.clone());
        Ok(tx)
    }

    async fn find_by_user(&self, user_id: &str) -> RiskGuardResult<Vec<Transaction>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|t| t.user_id == user_id).cloned().collect())
    }

    async fn find_by_user_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RiskGuardResult<Vec<Transaction>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|t| t.user_id == user_id && t.created_at >= start && t.created_at <= end)
            .cloned()
            .collect())
    }

    async fn sum_amount_by_user_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RiskGuardResult<BigDecimal> {
        let rows = self.find_by_user_in_range(user_id, start, end).await?;
        Ok(rows.iter().fold(BigDecimal::from(0), |acc, t| acc + &t.amount))
    }

    async fn count_since(&self, user_id: &str, since: DateTime<Utc>) -> RiskGuardResult<i64> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|t| t.user_id == user_id && t.created_at >= since)
            .count() as i64)
    }

    async fn list_since(&self, user_id: &str, since: DateTime<Utc>) -> RiskGuardResult<Vec<Transaction>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|t| t.user_id == user_id && t.created_at >= since)
            .cloned()
            .collect())
    }

    async fn list_same_amount_since(
        &self,
        user_id: &str,
        amount: &BigDecimal,
        since: DateTime<Utc>,
    ) -> RiskGuardResult<Vec<Transaction>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|t| t.user_id == user_id && t.created_at >= since && &t.amount == amount)
            .cloned()
            .collect())
    }

    async fn most_recent_with_location(&self, user_id: &str) -> RiskGuardResult<Option<Transaction>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|t| t.user_id == user_id && t.has_location())
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn previous_with_location(
        &self,
        user_id: &str,
        exclude_id: Uuid,
        before: DateTime<Utc>,
    ) -> RiskGuardResult<Option<Transaction>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|t| {
                t.user_id == user_id && t.id != exclude_id && t.has_location() && t.created_at < before
            })
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn distinct_country_count(&self, user_id: &str) -> RiskGuardResult<i64> {
        let rows = self.rows.read().await;
        let mut countries: Vec<&str> = rows
            .iter()
            .filter(|t| t.user_id == user_id)
            .filter_map(|t| t.country.as_deref())
            .collect();
        countries.sort_unstable();
        countries.dedup();
        Ok(countries.len() as i64)
    }

    async fn has_transacted_in_country(&self, user_id: &str, country: &str) -> RiskGuardResult<bool> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .any(|t| t.user_id == user_id && t.country.as_deref() == Some(country)))
    }

    async fn avg_amount_since(&self, user_id: &str, since: DateTime<Utc>) -> RiskGuardResult<BigDecimal> {
        let rows = self.list_since(user_id, since).await?;
        if rows.is_empty() {
            return Ok(BigDecimal::from(0));
        }
        let sum = rows.iter().fold(BigDecimal::from(0), |acc, t| acc + &t.amount);
        Ok(sum / BigDecimal::from(rows.len() as i64))
    }

    async fn stddev_amount_since(&self, user_id: &str, since: DateTime<Utc>) -> RiskGuardResult<BigDecimal> {
        let rows = self.list_since(user_id, since).await?;
        if rows.len() < 2 {
            return Ok(BigDecimal::from(0));
        }
        let mean = self.avg_amount_since(user_id, since).await?;
        let mean_f = mean.to_f64().ok_or_else(|| {
            RiskGuardError::Evaluation("mean amount does not fit in f64".to_string())
        })?;
        let variance: f64 = rows
            .iter()
            .map(|t| {
                let amount_f = t.amount.to_f64().unwrap_or(0.0);
                (amount_f - mean_f).powi(2)
            })
            .sum::<f64>()
            / (rows.len() as f64);
        let stddev = variance.sqrt();
        BigDecimal::from_str(&format!("{stddev:.10}"))
            .map_err(|e| RiskGuardError::Evaluation(format!("stddev conversion failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskguard_types::TransactionType;

    fn request(user_id: &str, amount: &str) -> TransactionRequest {
        TransactionRequest::new(
            user_id,
            BigDecimal::from_str(amount).unwrap(),
            "USD",
            TransactionType::Purchase,
        )
    }

    #[tokio::test]
    async fn save_assigns_id_and_timestamp() {
        let store = InMemoryTransactionStore::new();
        let tx = store.save(request("u1", "50.00")).await.unwrap();
        assert_ne!(tx.id, Uuid::nil());
    }

    #[tokio::test]
    async fn read_your_writes() {
        let store = InMemoryTransactionStore::new();
        store.save(request("u1", "50.00")).await.unwrap();
        store.save(request("u1", "60.00")).await.unwrap();
        let found = store.find_by_user("u1").await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn distinct_country_count_dedupes() {
        let store = InMemoryTransactionStore::new();
        let mut r1 = request("u1", "50.00");
        r1.country = Some("US".to_string());
        store.save(r1).await.unwrap();
        let mut r2 = request("u1", "60.00");
        r2.country = Some("US".to_string());
        store.save(r2).await.unwrap();
        let mut r3 = request("u1", "70.00");
        r3.country = Some("GB".to_string());
        store.save(r3).await.unwrap();
        assert_eq!(store.distinct_country_count("u1").await.unwrap(), 2);
    }
}
