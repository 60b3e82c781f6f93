//! JSON shapes for `event_data`, internal to this crate and the workflow
//! that appends these events — distinct from the external bus payloads in
//! `riskguard-bus`, which carry a wider field set for downstream consumers.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCreatedData {
    pub amount: BigDecimal,
    pub is_international: bool,
    /// Intrinsic per-transaction risk score known at creation time, before
    /// asynchronous rule evaluation runs. Fixed at the baseline fraud
    /// probability since the full assessment is not yet available when this
    /// event is appended (see the workflow's fire-and-forget ordering).
    pub risk_score: f64,
}

impl Default for TransactionCreatedData {
    fn default() -> Self {
        Self {
            amount: BigDecimal::from(0),
            is_international: false,
            risk_score: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserProfileUpdatedData {
    pub average_transaction_amount: Option<BigDecimal>,
    pub total_transactions: Option<i64>,
    pub total_transaction_value: Option<BigDecimal>,
    pub high_risk_transactions: Option<i64>,
    pub international_transactions: Option<i64>,
    pub behavioral_risk_score: Option<f64>,
    pub transaction_risk_score: Option<f64>,
    pub overall_risk_score: Option<f64>,
}

pub fn parse<T: for<'de> Deserialize<'de> + Default>(value: &Value) -> T {
    serde_json::from_value(value.clone()).unwrap_or_default()
}
