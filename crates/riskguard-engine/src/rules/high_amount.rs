use async_trait::async_trait;
use bigdecimal::BigDecimal;
use riskguard_types::{RiskGuardResult, Violation};
use std::str::FromStr;

use crate::context::RuleContext;
use crate::rule::FraudRule;
use crate::thresholds::RuleThresholds;

pub struct HighAmountRule {
    threshold: BigDecimal,
}

impl HighAmountRule {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: BigDecimal::from_str(&threshold.to_string()).expect("finite threshold"),
        }
    }
}

impl Default for HighAmountRule {
    fn default() -> Self {
        Self::new(RuleThresholds::default().high_amount_threshold)
    }
}

#[async_trait]
impl FraudRule for HighAmountRule {
    fn rule_id(&self) -> &'static str {
        "HIGH_AMOUNT"
    }

    async fn evaluate(&self, ctx: &RuleContext<'_>) -> RiskGuardResult<Option<Violation>> {
        if ctx.transaction.amount > self.threshold {
            return Ok(Some(Violation::new(
                self.rule_id(),
                format!("amount {} exceeds {}", ctx.transaction.amount, self.threshold),
                0.7,
            )));
        }
        Ok(None)
    }
}
