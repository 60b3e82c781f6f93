//! Strongly-typed event payloads, one per bus topic. `MessageBus::publish`
//! always receives a `serde_json::Value` built from one of these — never
//! hand-built JSON.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use riskguard_types::TransactionType;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct TransactionCreatedPayload {
    pub transaction_id: Uuid,
    pub user_id: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub transaction_type: TransactionType,
    pub merchant_category: Option<String>,
    pub merchant_name: Option<String>,
    pub is_international: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub ip_address: Option<String>,
    pub event_timestamp: DateTime<Utc>,
    pub event_id: Uuid,
    pub event_source: &'static str,
}

impl TransactionCreatedPayload {
    pub const EVENT_SOURCE: &'static str = "transaction-service";
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudAction {
    Review,
    Block,
}

#[derive(Debug, Clone, Serialize)]
pub struct FraudDetectedPayload {
    pub transaction_id: Uuid,
    pub user_id: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub merchant_category: Option<String>,
    pub is_international: bool,
    pub fraud_probability: f64,
    pub violated_rules: Vec<String>,
    pub risk_level: String,
    pub action: FraudAction,
    pub event_timestamp: DateTime<Utc>,
    pub event_id: Uuid,
    pub event_source: &'static str,
}

impl FraudDetectedPayload {
    pub const EVENT_SOURCE: &'static str = "fraud-detection-service";
}

#[derive(Debug, Clone, Serialize)]
pub struct FraudClearedPayload {
    pub transaction_id: Uuid,
    pub user_id: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub merchant_category: Option<String>,
    pub fraud_probability: f64,
    pub risk_level: &'static str,
    pub checks_performed: i32,
    pub event_timestamp: DateTime<Utc>,
    pub event_id: Uuid,
    pub event_source: &'static str,
}

impl FraudClearedPayload {
    pub const EVENT_SOURCE: &'static str = "fraud-detection-service";
    pub const RISK_LEVEL: &'static str = "LOW";
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockSeverity {
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionBlockedPayload {
    pub transaction_id: Uuid,
    pub user_id: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub merchant_category: Option<String>,
    pub is_international: bool,
    pub block_reason: String,
    pub violated_rules: Vec<String>,
    pub fraud_probability: f64,
    pub severity: BlockSeverity,
    pub event_timestamp: DateTime<Utc>,
    pub event_id: Uuid,
    pub event_source: &'static str,
}

impl TransactionBlockedPayload {
    pub const EVENT_SOURCE: &'static str = "fraud-detection-service";
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfileUpdatedPayload {
    pub user_id: String,
    pub previous_overall_risk_score: f64,
    pub new_overall_risk_score: f64,
    pub total_transactions: i64,
    pub total_transaction_value: BigDecimal,
    pub high_risk_transactions: i64,
    pub update_reason: String,
    pub triggering_transaction_id: Uuid,
    pub event_timestamp: DateTime<Utc>,
    pub event_id: Uuid,
    pub event_source: &'static str,
}

impl UserProfileUpdatedPayload {
    pub const EVENT_SOURCE: &'static str = "profile-service";
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Warning,
    Urgent,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct HighRiskUserIdentifiedPayload {
    pub user_id: String,
    pub overall_risk_score: f64,
    pub risk_threshold: f64,
    pub risk_factors: Vec<String>,
    pub alert_severity: AlertSeverity,
    pub recommended_action: String,
    pub event_timestamp: DateTime<Utc>,
    pub event_id: Uuid,
    pub event_source: &'static str,
}

impl HighRiskUserIdentifiedPayload {
    pub const EVENT_SOURCE: &'static str = "risk-assessment-service";

    pub fn severity_for_score(score: f64) -> AlertSeverity {
        if score >= 0.9 {
            AlertSeverity::Critical
        } else if score >= 0.8 {
            AlertSeverity::Urgent
        } else {
            AlertSeverity::Warning
        }
    }
}
