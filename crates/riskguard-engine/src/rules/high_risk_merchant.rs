use async_trait::async_trait;
use riskguard_types::{RiskGuardResult, Violation};

use crate::context::RuleContext;
use crate::rule::FraudRule;

const HIGH_RISK_CATEGORIES: [&str; 3] = ["GAMBLING", "CRYPTO", "ADULT_ENTERTAINMENT"];

pub struct HighRiskMerchantRule;

#[async_trait]
impl FraudRule for HighRiskMerchantRule {
    fn rule_id(&self) -> &'static str {
        "HIGH_RISK_MERCHANT"
    }

    async fn evaluate(&self, ctx: &RuleContext<'_>) -> RiskGuardResult<Option<Violation>> {
        let Some(category) = ctx.transaction.merchant_category.as_deref() else {
            return Ok(None);
        };
        if HIGH_RISK_CATEGORIES.contains(&category) {
            return Ok(Some(Violation::new(
                self.rule_id(),
                format!("merchant category {category} is high-risk"),
                0.8,
            )));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::rule::FraudRule;
    use crate::rules::test_support::{empty_merchant_frequency, empty_store, profile_with_total_transactions, transaction};

    #[tokio::test]
    async fn flags_gambling_category() {
        let mut tx = transaction("u1", "20.00", Utc::now());
        tx.merchant_category = Some("GAMBLING".to_string());
        let profile = profile_with_total_transactions(5);
        let freq = empty_merchant_frequency();
        let ctx = RuleContext {
            transaction: &tx,
            profile: &profile,
            merchant_frequency: &freq,
            transaction_store: empty_store(),
        };
        let violation = HighRiskMerchantRule.evaluate(&ctx).await.unwrap().unwrap();
        assert_eq!(violation.risk_score, 0.8);
    }

    #[tokio::test]
    async fn ignores_ordinary_category() {
        let mut tx = transaction("u1", "20.00", Utc::now());
        tx.merchant_category = Some("GROCERIES".to_string());
        let profile = profile_with_total_transactions(5);
        let freq = empty_merchant_frequency();
        let ctx = RuleContext {
            transaction: &tx,
            profile: &profile,
            merchant_frequency: &freq,
            transaction_store: empty_store(),
        };
        assert!(HighRiskMerchantRule.evaluate(&ctx).await.unwrap().is_none());
    }
}
