use async_trait::async_trait;
use riskguard_types::{RiskGuardResult, UserType, Violation};

use crate::context::RuleContext;
use crate::rule::FraudRule;

pub struct GeographicNewUserNewCountryRule;

#[async_trait]
impl FraudRule for GeographicNewUserNewCountryRule {
    fn rule_id(&self) -> &'static str {
        "GEOGRAPHIC_NEW_USER_NEW_COUNTRY"
    }

    async fn evaluate(&self, ctx: &RuleContext<'_>) -> RiskGuardResult<Option<Violation>> {
        if ctx.profile.user_type() != UserType::NewUser {
            return Ok(None);
        }
        let Some(country) = ctx.transaction.country.as_deref() else {
            return Ok(None);
        };
        let history = ctx.transaction_store.find_by_user(&ctx.transaction.user_id).await?;
        let seen_before = history
            .iter()
            .filter(|t| t.id != ctx.transaction.id)
            .any(|t| t.country.as_deref() == Some(country));
        if !seen_before {
            return Ok(Some(Violation::new(
                self.rule_id(),
                format!("new user transacting in previously unseen country {country}"),
                0.75,
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
    async fn flags_new_user_in_unseen_country() {
        let mut tx = transaction("u1", "20.00", Utc::now());
        tx.country = Some("GB".to_string());
        let profile = profile_with_total_transactions(1);
        let freq = empty_merchant_frequency();
        let ctx = RuleContext {
            transaction: &tx,
            profile: &profile,
            merchant_frequency: &freq,
            transaction_store: empty_store(),
        };
        let violation = GeographicNewUserNewCountryRule.evaluate(&ctx).await.unwrap().unwrap();
        assert_eq!(violation.risk_score, 0.75);
    }

    #[tokio::test]
    async fn ignores_established_users() {
        let mut tx = transaction("u1", "20.00", Utc::now());
        tx.country = Some("GB".to_string());
        let profile = profile_with_total_transactions(60);
        let freq = empty_merchant_frequency();
        let ctx = RuleContext {
            transaction: &tx,
            profile: &profile,
            merchant_frequency: &freq,
            transaction_store: empty_store(),
        };
        assert!(GeographicNewUserNewCountryRule.evaluate(&ctx).await.unwrap().is_none());
    }
}
