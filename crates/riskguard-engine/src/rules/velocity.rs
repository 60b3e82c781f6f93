use async_trait::async_trait;
use chrono::Duration;
use riskguard_types::{RiskGuardResult, Violation};

use crate::context::RuleContext;
use crate::rule::FraudRule;
use crate::thresholds::RuleThresholds;

pub struct Velocity5MinRule {
    limit: i64,
}

impl Velocity5MinRule {
    pub fn new(limit: i64) -> Self {
        Self { limit }
    }
}

impl Default for Velocity5MinRule {
    fn default() -> Self {
        Self::new(RuleThresholds::default().velocity_5min_limit)
    }
}

#[async_trait]
impl FraudRule for Velocity5MinRule {
    fn rule_id(&self) -> &'static str {
        "VELOCITY_5MIN"
    }

    async fn evaluate(&self, ctx: &RuleContext<'_>) -> RiskGuardResult<Option<Violation>> {
        let since = ctx.transaction.created_at - Duration::minutes(5);
        // The current transaction is already durably saved by the time
        // evaluation runs (workflow step 2 precedes step 5's enqueue), so
        // it must be excluded here to count only what preceded it.
        let recent = ctx
            .transaction_store
            .list_since(&ctx.transaction.user_id, since)
            .await?;
        let count = recent.iter().filter(|t| t.id != ctx.transaction.id).count() as i64;
        if count > self.limit {
            let risk_score = (0.6 + 0.1 * (count - self.limit) as f64).min(1.0);
            return Ok(Some(Violation::new(
                self.rule_id(),
                format!("{count} transactions in the last 5 minutes"),
                risk_score,
            )));
        }
        Ok(None)
    }
}
