//! Per-user risk profile snapshot: the aggregate state `ProfileProjection`
//! folds out of the event log.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    NewUser,
    ModerateHistory,
    Established,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            RiskLevel::Critical
        } else if score >= 0.6 {
            RiskLevel::High
        } else if score >= 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskProfile {
    pub user_id: String,
    pub average_transaction_amount: BigDecimal,
    pub total_transactions: i64,
    pub total_transaction_value: BigDecimal,
    pub high_risk_transactions: i64,
    pub international_transactions: i64,
    pub behavioral_risk_score: f64,
    pub transaction_risk_score: f64,
    pub overall_risk_score: f64,
    pub first_transaction_date: DateTime<Utc>,
    pub last_transaction_date: DateTime<Utc>,
    /// High-water mark of the event `sequence_number`s already folded into
    /// this snapshot. Bookkeeping only, not a risk field in its own right;
    /// it's what lets `ProfileProjection::apply` be safely re-run over a
    /// batch that overlaps what was already applied — the property that
    /// makes `replay_incremental_since` idempotent — without
    /// double-counting. `ProfileProjection::build` always starts from a
    /// fresh snapshot and sets this directly; it never filters.
    pub last_applied_sequence: i64,
}

impl RiskProfile {
    /// The initial snapshot for a user with no events yet: zero counters,
    /// all scores at the neutral midpoint, dates pinned to `now`.
    pub fn initial(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            average_transaction_amount: BigDecimal::from(0),
            total_transactions: 0,
            total_transaction_value: BigDecimal::from(0),
            high_risk_transactions: 0,
            international_transactions: 0,
            behavioral_risk_score: 0.5,
            transaction_risk_score: 0.5,
            overall_risk_score: 0.5,
            first_transaction_date: now,
            last_transaction_date: now,
            last_applied_sequence: 0,
        }
    }

    pub fn user_type(&self) -> UserType {
        if self.total_transactions <= 2 {
            UserType::NewUser
        } else if self.total_transactions <= 50 {
            UserType::ModerateHistory
        } else {
            UserType::Established
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.overall_risk_score)
    }

    /// Non-persisted comparison against a prior snapshot's overall score.
    /// Never participates in the projection fold; it exists purely as a
    /// convenience for replay progress logging and observability.
    pub fn risk_trend(&self, previous: &RiskProfile) -> RiskTrend {
        let delta = self.overall_risk_score - previous.overall_risk_score;
        if delta > 0.02 {
            RiskTrend::Deteriorating
        } else if delta < -0.02 {
            RiskTrend::Improving
        } else {
            RiskTrend::Stable
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTrend {
    Improving,
    Stable,
    Deteriorating,
}
