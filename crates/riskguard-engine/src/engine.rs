use futures::future::join_all;
use riskguard_types::{RiskGuardResult, Violation};
use std::sync::Arc;

use crate::context::RuleContext;
use crate::rule::FraudRule;
use crate::rules::{
    AmountSpikeRule, GeographicCountryHoppingRule, GeographicNewUserNewCountryRule, HighAmountRule,
    HighRiskMerchantRule, ImpossibleTravelRule, UnusualHourRule, Velocity5MinRule,
};
use crate::thresholds::RuleThresholds;

/// Evaluates a transaction against the full rule set. Rules are side-effect
/// free, so they run concurrently; violations are then sorted by `rule_id`
/// so an assessment's output is reproducible regardless of scheduling order.
pub struct RuleEngine {
    rules: Vec<Arc<dyn FraudRule>>,
}

impl RuleEngine {
    /// Builds the standard rule set, with the four tunable rules
    /// (`HighAmountRule`, `Velocity5MinRule`, `AmountSpikeRule`,
    /// `ImpossibleTravelRule`) wired to the supplied thresholds instead of
    /// their own hardcoded constants.
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self {
            rules: vec![
                Arc::new(HighAmountRule::new(thresholds.high_amount_threshold)),
                Arc::new(HighRiskMerchantRule),
                Arc::new(Velocity5MinRule::new(thresholds.velocity_5min_limit)),
                Arc::new(GeographicNewUserNewCountryRule),
                Arc::new(GeographicCountryHoppingRule),
                Arc::new(ImpossibleTravelRule::new(thresholds.impossible_travel_speed_kmh)),
                Arc::new(AmountSpikeRule::new(thresholds.amount_spike_min_history)),
                Arc::new(UnusualHourRule),
            ],
        }
    }

    pub fn with_rules(rules: Vec<Arc<dyn FraudRule>>) -> Self {
        Self { rules }
    }

    pub async fn evaluate(&self, ctx: &RuleContext<'_>) -> RiskGuardResult<Vec<Violation>> {
        let active = self.rules.iter().filter(|r| r.is_active());
        let results = join_all(active.map(|rule| rule.evaluate(ctx))).await;

        let mut violations = Vec::new();
        for result in results {
            if let Some(violation) = result? {
                violations.push(violation);
            }
        }
        violations.sort_by(|a, b| a.rule_id.cmp(&b.rule_id));
        Ok(violations)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(RuleThresholds::default())
    }
}
