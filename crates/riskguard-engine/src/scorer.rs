use riskguard_types::{FraudAssessment, RiskProfile, UserType, Violation};
use tracing::instrument;

use crate::thresholds::ScoringThresholds;

const BASELINE_PROBABILITY: f64 = 0.05;

/// Fuses violations into a single fraud probability via noisy-OR, which is
/// commutative and associative and therefore independent of rule ordering.
#[instrument(skip_all, fields(user_id = %profile.user_id, violation_count = violations.len()))]
pub fn assess(profile: &RiskProfile, violations: Vec<Violation>, thresholds: ScoringThresholds) -> FraudAssessment {
    let mut probability = BASELINE_PROBABILITY;
    for violation in &violations {
        probability = 1.0 - (1.0 - probability) * (1.0 - violation.risk_score);
    }
    if profile.user_type() == UserType::NewUser {
        probability = (probability * thresholds.new_user_multiplier).min(1.0);
    }

    let should_block = probability >= thresholds.block_threshold;
    tracing::info!(
        fraud_probability = probability,
        should_block,
        decision = %decision_label(probability, thresholds),
        "fraud assessment complete"
    );

    FraudAssessment {
        fraud_probability: probability,
        violations,
        should_block,
    }
}

fn decision_label(probability: f64, thresholds: ScoringThresholds) -> &'static str {
    if probability >= thresholds.block_threshold {
        "BLOCK"
    } else if probability >= thresholds.review_threshold {
        "REVIEW"
    } else {
        "CLEAR"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn established_profile() -> RiskProfile {
        let mut p = RiskProfile::initial("u1", Utc::now());
        p.total_transactions = 100;
        p
    }

    #[test]
    fn no_violations_stays_near_baseline() {
        let assessment = assess(&established_profile(), vec![], ScoringThresholds::default());
        assert!((assessment.fraud_probability - BASELINE_PROBABILITY).abs() < 1e-9);
        assert!(!assessment.should_block);
    }

    #[test]
    fn noisy_or_is_order_independent() {
        let violations_a = vec![
            Violation::new("A", "a", 0.5),
            Violation::new("B", "b", 0.3),
            Violation::new("C", "c", 0.9),
        ];
        let violations_b = vec![
            Violation::new("C", "c", 0.9),
            Violation::new("A", "a", 0.5),
            Violation::new("B", "b", 0.3),
        ];
        let a = assess(&established_profile(), violations_a, ScoringThresholds::default());
        let b = assess(&established_profile(), violations_b, ScoringThresholds::default());
        assert!((a.fraud_probability - b.fraud_probability).abs() < 1e-12);
    }

    #[test]
    fn new_user_multiplier_increases_probability() {
        let mut new_user = RiskProfile::initial("u2", Utc::now());
        new_user.total_transactions = 1;
        let violations = vec![Violation::new("HIGH_AMOUNT", "x", 0.7)];
        let established = assess(&established_profile(), violations.clone(), ScoringThresholds::default());
        let new = assess(&new_user, violations, ScoringThresholds::default());
        assert!(new.fraud_probability > established.fraud_probability);
    }

    #[test]
    fn high_combined_score_blocks() {
        let violations = vec![
            Violation::new("HIGH_AMOUNT", "a", 0.7),
            Violation::new("HIGH_RISK_MERCHANT", "b", 0.8),
            Violation::new("GEOGRAPHIC_NEW_USER_NEW_COUNTRY", "c", 0.75),
        ];
        let assessment = assess(&established_profile(), violations, ScoringThresholds::default());
        assert!(assessment.fraud_probability >= 0.8);
        assert!(assessment.should_block);
    }
}
