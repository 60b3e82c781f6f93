use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use riskguard_types::{RiskGuardResult, Transaction, TransactionRequest};
use uuid::Uuid;

/// Durable store of transactions, indexed by `(user_id, created_at)`,
/// `merchant_category`, and `(user_id, country)`. All read queries are
/// deterministic given committed data; writes appear fully before any read
/// observes them.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Assigns `id`/`created_at` if absent, validates, persists, and returns
    /// the persisted row.
    async fn save(&self, request: TransactionRequest) -> RiskGuardResult<Transaction>;

    async fn find_by_user(&self, user_id: &str) -> RiskGuardResult<Vec<Transaction>>;

    async fn find_by_user_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RiskGuardResult<Vec<Transaction>>;

    async fn sum_amount_by_user_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RiskGuardResult<BigDecimal>;

    /// Velocity query: count of the user's transactions since `since`.
    async fn count_since(&self, user_id: &str, since: DateTime<Utc>) -> RiskGuardResult<i64>;

    async fn list_since(&self, user_id: &str, since: DateTime<Utc>) -> RiskGuardResult<Vec<Transaction>>;

    async fn list_same_amount_since(
        &self,
        user_id: &str,
        amount: &BigDecimal,
        since: DateTime<Utc>,
    ) -> RiskGuardResult<Vec<Transaction>>;

    /// Most recent transaction for the user that carries a location, used by
    /// the impossible-travel rule.
    async fn most_recent_with_location(&self, user_id: &str) -> RiskGuardResult<Option<Transaction>>;

    async fn previous_with_location(
        &self,
        user_id: &str,
        exclude_id: Uuid,
        before: DateTime<Utc>,
    ) -> RiskGuardResult<Option<Transaction>>;

    async fn distinct_country_count(&self, user_id: &str) -> RiskGuardResult<i64>;

    async fn has_transacted_in_country(&self, user_id: &str, country: &str) -> RiskGuardResult<bool>;

    async fn avg_amount_since(&self, user_id: &str, since: DateTime<Utc>) -> RiskGuardResult<BigDecimal>;

    async fn stddev_amount_since(&self, user_id: &str, since: DateTime<Utc>) -> RiskGuardResult<BigDecimal>;
}
