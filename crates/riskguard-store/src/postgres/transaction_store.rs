use async_trait::async_trait;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, Utc};
use riskguard_types::{RiskGuardError, RiskGuardResult, Transaction, TransactionRequest, TransactionType};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use crate::TransactionStore;

pub struct PostgresTransactionStore {
    pool: PgPool,
}

impl PostgresTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: String,
    amount: BigDecimal,
    currency: String,
    created_at: DateTime<Utc>,
    transaction_type: String,
    merchant_category: Option<String>,
    merchant_name: Option<String>,
    is_international: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
    country: Option<String>,
    city: Option<String>,
    ip_address: Option<String>,
}

impl TransactionRow {
    fn into_transaction(self) -> RiskGuardResult<Transaction> {
        let transaction_type = match self.transaction_type.as_str() {
            "PURCHASE" => TransactionType::Purchase,
            "TRANSFER" => TransactionType::Transfer,
            "WITHDRAWAL" => TransactionType::Withdrawal,
            "DEPOSIT" => TransactionType::Deposit,
            "REFUND" => TransactionType::Refund,
            other => {
                return Err(RiskGuardError::Storage(format!(
                    "unknown transaction_type in row: {other}"
                )))
            }
        };
        Ok(Transaction {
            id: self.id,
            user_id: self.user_id,
            amount: self.amount,
            currency: self.currency,
            created_at: self.created_at,
            transaction_type,
            merchant_category: self.merchant_category,
            merchant_name: self.merchant_name,
            is_international: self.is_international,
            latitude: self.latitude,
            longitude: self.longitude,
            country: self.country,
            city: self.city,
            ip_address: self.ip_address,
        })
    }
}

fn type_label(t: TransactionType) -> &'static str {
    match t {
        TransactionType::Purchase => "PURCHASE",
        TransactionType::Transfer => "TRANSFER",
        TransactionType::Withdrawal => "WITHDRAWAL",
        TransactionType::Deposit => "DEPOSIT",
        TransactionType::Refund => "REFUND",
    }
}

#[async_trait]
impl TransactionStore for PostgresTransactionStore {
    async fn save(&self, request: TransactionRequest) -> RiskGuardResult<Transaction> {
        request
            .validate()
            .map_err(|e| RiskGuardError::Validation(e.to_string()))?;

        let id = request.id.unwrap_or_else(Uuid::new_v4);
        let created_at = request.created_at.unwrap_or_else(Utc::now);

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, user_id, amount, currency, created_at, transaction_type,
                merchant_category, merchant_name, is_international,
                latitude, longitude, country, city, ip_address
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(id)
        .bind(&request.user_id)
        .bind(&request.amount)
        .bind(&request.currency)
        .bind(created_at)
        .bind(type_label(request.transaction_type))
        .bind(&request.merchant_category)
        .bind(&request.merchant_name)
        .bind(request.is_international)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(&request.country)
        .bind(&request.city)
        .bind(&request.ip_address)
        .execute(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;

        Ok(Transaction {
            id,
            user_id: request.user_id,
            amount: request.amount,
            currency: request.currency,
            created_at,
            transaction_type: request.transaction_type,
            merchant_category: request.merchant_category,
            merchant_name: request.merchant_name,
            is_international: request.is_international,
            latitude: request.latitude,
            longitude: request.longitude,
            country: request.country,
            city: request.city,
            ip_address: request.ip_address,
        })
    }

    async fn find_by_user(&self, user_id: &str) -> RiskGuardResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> =
            sqlx::query_as("SELECT * FROM transactions WHERE user_id = $1 ORDER BY created_at ASC")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        rows.into_iter().map(TransactionRow::into_transaction).collect()
    }

    async fn find_by_user_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RiskGuardResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            "SELECT * FROM transactions WHERE user_id = $1 AND created_at >= $2 AND created_at <= $3 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        rows.into_iter().map(TransactionRow::into_transaction).collect()
    }

    async fn sum_amount_by_user_in_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RiskGuardResult<BigDecimal> {
        let sum: Option<BigDecimal> = sqlx::query_scalar(
            "SELECT SUM(amount) FROM transactions WHERE user_id = $1 AND created_at >= $2 AND created_at <= $3",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        Ok(sum.unwrap_or_else(|| BigDecimal::from(0)))
    }

    async fn count_since(&self, user_id: &str, since: DateTime<Utc>) -> RiskGuardResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        Ok(count)
    }

    async fn list_since(&self, user_id: &str, since: DateTime<Utc>) -> RiskGuardResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            "SELECT * FROM transactions WHERE user_id = $1 AND created_at >= $2 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        rows.into_iter().map(TransactionRow::into_transaction).collect()
    }

    async fn list_same_amount_since(
        &self,
        user_id: &str,
        amount: &BigDecimal,
        since: DateTime<Utc>,
    ) -> RiskGuardResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            "SELECT * FROM transactions WHERE user_id = $1 AND amount = $2 AND created_at >= $3 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .bind(amount)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        rows.into_iter().map(TransactionRow::into_transaction).collect()
    }

    async fn most_recent_with_location(&self, user_id: &str) -> RiskGuardResult<Option<Transaction>> {
        let row: Option<TransactionRow> = sqlx::query_as(
            "SELECT * FROM transactions WHERE user_id = $1 AND latitude IS NOT NULL AND longitude IS NOT NULL ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        row.map(TransactionRow::into_transaction).transpose()
    }

    async fn previous_with_location(
        &self,
        user_id: &str,
        exclude_id: Uuid,
        before: DateTime<Utc>,
    ) -> RiskGuardResult<Option<Transaction>> {
        let row: Option<TransactionRow> = sqlx::query_as(
            r#"
            SELECT * FROM transactions
            WHERE user_id = $1 AND id != $2 AND latitude IS NOT NULL AND longitude IS NOT NULL
                AND created_at < $3
            ORDER BY created_at DESC LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(exclude_id)
        .bind(before)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        row.map(TransactionRow::into_transaction).transpose()
    }

    async fn distinct_country_count(&self, user_id: &str) -> RiskGuardResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT country) FROM transactions WHERE user_id = $1 AND country IS NOT NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        Ok(count)
    }

    async fn has_transacted_in_country(&self, user_id: &str, country: &str) -> RiskGuardResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE user_id = $1 AND country = $2",
        )
        .bind(user_id)
        .bind(country)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        Ok(count > 0)
    }

    async fn avg_amount_since(&self, user_id: &str, since: DateTime<Utc>) -> RiskGuardResult<BigDecimal> {
        let avg: Option<BigDecimal> = sqlx::query_scalar(
            "SELECT AVG(amount) FROM transactions WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        Ok(avg.unwrap_or_else(|| BigDecimal::from(0)))
    }

    async fn stddev_amount_since(&self, user_id: &str, since: DateTime<Utc>) -> RiskGuardResult<BigDecimal> {
        let amounts: Vec<BigDecimal> = sqlx::query_scalar(
            "SELECT amount FROM transactions WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;

        if amounts.len() < 2 {
            return Ok(BigDecimal::from(0));
        }
        let values: Vec<f64> = amounts.iter().map(|a| a.to_f64().unwrap_or(0.0)).collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        BigDecimal::from_str(&format!("{:.10}", variance.sqrt()))
            .map_err(|e| RiskGuardError::Evaluation(format!("stddev conversion failed: {e}")))
    }
}
