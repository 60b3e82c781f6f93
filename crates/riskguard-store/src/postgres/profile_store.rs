use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use riskguard_types::{RiskGuardError, RiskGuardResult, RiskProfile};
use sqlx::{FromRow, PgPool};

use crate::ProfileStore;

pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ProfileRow {
    user_id: String,
    average_transaction_amount: BigDecimal,
    total_transactions: i64,
    total_transaction_value: BigDecimal,
    high_risk_transactions: i64,
    international_transactions: i64,
    behavioral_risk_score: f64,
    transaction_risk_score: f64,
    overall_risk_score: f64,
    first_transaction_date: DateTime<Utc>,
    last_transaction_date: DateTime<Utc>,
    last_applied_sequence: i64,
}

impl From<ProfileRow> for RiskProfile {
    fn from(row: ProfileRow) -> Self {
        RiskProfile {
            user_id: row.user_id,
            average_transaction_amount: row.average_transaction_amount,
            total_transactions: row.total_transactions,
            total_transaction_value: row.total_transaction_value,
            high_risk_transactions: row.high_risk_transactions,
            international_transactions: row.international_transactions,
            behavioral_risk_score: row.behavioral_risk_score,
            transaction_risk_score: row.transaction_risk_score,
            overall_risk_score: row.overall_risk_score,
            first_transaction_date: row.first_transaction_date,
            last_transaction_date: row.last_transaction_date,
            last_applied_sequence: row.last_applied_sequence,
        }
    }
}

#[async_trait]
impl ProfileStore for PostgresProfileStore {
    async fn get(&self, user_id: &str) -> RiskGuardResult<Option<RiskProfile>> {
        let row: Option<ProfileRow> =
            sqlx::query_as("SELECT * FROM user_risk_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        Ok(row.map(RiskProfile::from))
    }

    async fn upsert(&self, profile: RiskProfile) -> RiskGuardResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_risk_profiles (
                user_id, average_transaction_amount, total_transactions, total_transaction_value,
                high_risk_transactions, international_transactions, behavioral_risk_score,
                transaction_risk_score, overall_risk_score, first_transaction_date, last_transaction_date,
                last_applied_sequence
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (user_id) DO UPDATE SET
                average_transaction_amount = EXCLUDED.average_transaction_amount,
                total_transactions = EXCLUDED.total_transactions,
                total_transaction_value = EXCLUDED.total_transaction_value,
                high_risk_transactions = EXCLUDED.high_risk_transactions,
                international_transactions = EXCLUDED.international_transactions,
                behavioral_risk_score = EXCLUDED.behavioral_risk_score,
                transaction_risk_score = EXCLUDED.transaction_risk_score,
                overall_risk_score = EXCLUDED.overall_risk_score,
                first_transaction_date = EXCLUDED.first_transaction_date,
                last_transaction_date = EXCLUDED.last_transaction_date,
                last_applied_sequence = EXCLUDED.last_applied_sequence
            "#,
        )
        .bind(&profile.user_id)
        .bind(&profile.average_transaction_amount)
        .bind(profile.total_transactions)
        .bind(&profile.total_transaction_value)
        .bind(profile.high_risk_transactions)
        .bind(profile.international_transactions)
        .bind(profile.behavioral_risk_score)
        .bind(profile.transaction_risk_score)
        .bind(profile.overall_risk_score)
        .bind(profile.first_transaction_date)
        .bind(profile.last_transaction_date)
        .bind(profile.last_applied_sequence)
        .execute(&self.pool)
        .await
        .map_err(|e| RiskGuardError::Storage(e.to_string()))?;
        Ok(())
    }
}
