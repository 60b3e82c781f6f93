//! Transient fraud-assessment types produced by the rule engine and scorer.
//! Never persisted directly; only their consequences (events, profile
//! updates) are stored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub description: String,
    pub risk_score: f64,
    pub metadata: HashMap<String, Value>,
}

impl Violation {
    pub fn new(rule_id: impl Into<String>, description: impl Into<String>, risk_score: f64) -> Self {
        Self {
            rule_id: rule_id.into(),
            description: description.into(),
            risk_score,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudDecision {
    Clear,
    Review,
    Block,
}

impl FraudDecision {
    pub fn from_probability(p: f64) -> Self {
        if p >= 0.8 {
            FraudDecision::Block
        } else if p >= 0.5 {
            FraudDecision::Review
        } else {
            FraudDecision::Clear
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudAssessment {
    pub fraud_probability: f64,
    pub violations: Vec<Violation>,
    pub should_block: bool,
}

impl FraudAssessment {
    pub fn decision(&self) -> FraudDecision {
        FraudDecision::from_probability(self.fraud_probability)
    }

    /// Rule ids joined by `;`, matching the `violation_summary` the scorer
    /// attaches to published fraud events.
    pub fn violation_summary(&self) -> String {
        self.violations
            .iter()
            .map(|v| v.rule_id.as_str())
            .collect::<Vec<_>>()
            .join(";")
    }
}
