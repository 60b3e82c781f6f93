//! Tunable constants threaded from the caller's configuration into the rule
//! set and scorer, the way the teacher's `risk_integration.rs` reads
//! `thresholds.auto_block_threshold`/`manual_review_threshold` instead of
//! hardcoding them. Every field here defaults to the fixed value spec.md's
//! rule descriptions name, so a caller that doesn't care can use
//! `Default::default()` and get the documented behaviour unchanged.

/// Knobs consumed by individual `FraudRule`s.
#[derive(Debug, Clone, Copy)]
pub struct RuleThresholds {
    pub high_amount_threshold: f64,
    pub velocity_5min_limit: i64,
    pub amount_spike_min_history: i64,
    pub impossible_travel_speed_kmh: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            high_amount_threshold: 10_000.0,
            velocity_5min_limit: 3,
            amount_spike_min_history: 10,
            impossible_travel_speed_kmh: 1_000.0,
        }
    }
}

/// Knobs consumed by `FraudScorer::assess`.
#[derive(Debug, Clone, Copy)]
pub struct ScoringThresholds {
    pub new_user_multiplier: f64,
    pub block_threshold: f64,
    pub review_threshold: f64,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            new_user_multiplier: 1.15,
            block_threshold: 0.8,
            review_threshold: 0.5,
        }
    }
}
