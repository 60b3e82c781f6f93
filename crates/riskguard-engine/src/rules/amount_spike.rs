use async_trait::async_trait;
use bigdecimal::ToPrimitive;
use chrono::Duration;
use riskguard_types::{RiskGuardResult, Violation};

use crate::context::RuleContext;
use crate::rule::FraudRule;
use crate::thresholds::RuleThresholds;

pub struct AmountSpikeRule {
    min_history: i64,
}

impl AmountSpikeRule {
    pub fn new(min_history: i64) -> Self {
        Self { min_history }
    }
}

impl Default for AmountSpikeRule {
    fn default() -> Self {
        Self::new(RuleThresholds::default().amount_spike_min_history)
    }
}

#[async_trait]
impl FraudRule for AmountSpikeRule {
    fn rule_id(&self) -> &'static str {
        "AMOUNT_SPIKE"
    }

    async fn evaluate(&self, ctx: &RuleContext<'_>) -> RiskGuardResult<Option<Violation>> {
        if ctx.profile.total_transactions < self.min_history {
            return Ok(None);
        }
        let since = ctx.transaction.created_at - Duration::days(30);
        let history = ctx
            .transaction_store
            .list_since(&ctx.transaction.user_id, since)
            .await?;
        let prior_amounts: Vec<f64> = history
            .iter()
            .filter(|t| t.id != ctx.transaction.id)
            .map(|t| t.amount.to_f64().unwrap_or(0.0))
            .collect();
        if prior_amounts.is_empty() {
            return Ok(None);
        }
        let mean = prior_amounts.iter().sum::<f64>() / prior_amounts.len() as f64;
        let variance =
            prior_amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / prior_amounts.len() as f64;
        let stddev = variance.sqrt();

        let amount = ctx.transaction.amount.to_f64().unwrap_or(0.0);
        if stddev > 0.0 {
            if amount > mean + 5.0 * stddev {
                return Ok(Some(Violation::new(
                    "AMOUNT_EXTREME_SPIKE",
                    format!("amount {amount} exceeds mean + 5 stddev ({mean:.2} + 5*{stddev:.2})"),
                    0.85,
                )));
            }
            if amount > mean + 3.0 * stddev {
                return Ok(Some(Violation::new(
                    self.rule_id(),
                    format!("amount {amount} exceeds mean + 3 stddev ({mean:.2} + 3*{stddev:.2})"),
                    0.7,
                )));
            }
        } else if amount > mean {
            // Zero historical variance: the user's prior amounts are
            // identical, so any deviation at all is the most anomalous
            // signal this rule can observe. Matches the "30 identical
            // transactions then a spike" scenario in the testable
            // properties; see DESIGN.md.
            return Ok(Some(Violation::new(
                "AMOUNT_EXTREME_SPIKE",
                format!("amount {amount} exceeds uniform historical amount {mean:.2} (stddev=0)"),
                0.85,
            )));
        }
        Ok(None)
    }
}
