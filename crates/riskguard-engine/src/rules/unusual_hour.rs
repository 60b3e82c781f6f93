use async_trait::async_trait;
use bigdecimal::ToPrimitive;
use chrono::Timelike;
use riskguard_types::{RiskGuardResult, Violation};

use crate::context::RuleContext;
use crate::rule::FraudRule;

const UNUSUAL_HOURS: [u32; 6] = [0, 1, 2, 3, 4, 5];

pub struct UnusualHourRule;

#[async_trait]
impl FraudRule for UnusualHourRule {
    fn rule_id(&self) -> &'static str {
        "UNUSUAL_HOUR"
    }

    async fn evaluate(&self, ctx: &RuleContext<'_>) -> RiskGuardResult<Option<Violation>> {
        let hour = ctx.transaction.created_at.hour();
        if !UNUSUAL_HOURS.contains(&hour) {
            return Ok(None);
        }
        let amount = ctx.transaction.amount.to_f64().unwrap_or(0.0);
        let average = ctx.profile.average_transaction_amount.to_f64().unwrap_or(0.0);
        if amount > average * 2.0 {
            return Ok(Some(Violation::new(
                self.rule_id(),
                format!("transaction at UTC hour {hour} is more than double the user's average amount"),
                0.4,
            )));
        }
        Ok(None)
    }
}
