use async_trait::async_trait;
use riskguard_types::{RiskGuardResult, UserType, Violation};

use crate::context::RuleContext;
use crate::rule::FraudRule;

pub struct GeographicCountryHoppingRule;

#[async_trait]
impl FraudRule for GeographicCountryHoppingRule {
    fn rule_id(&self) -> &'static str {
        "GEOGRAPHIC_COUNTRY_HOPPING"
    }

    async fn evaluate(&self, ctx: &RuleContext<'_>) -> RiskGuardResult<Option<Violation>> {
        if ctx.profile.user_type() != UserType::Established {
            return Ok(None);
        }
        let Some(country) = ctx.transaction.country.as_deref() else {
            return Ok(None);
        };
        let history = ctx.transaction_store.find_by_user(&ctx.transaction.user_id).await?;
        let mut prior_countries: Vec<&str> = history
            .iter()
            .filter(|t| t.id != ctx.transaction.id)
            .filter_map(|t| t.country.as_deref())
            .collect();
        prior_countries.sort_unstable();
        prior_countries.dedup();
        let is_new_country = !prior_countries.contains(&country);
        let projected = prior_countries.len() as i64 + if is_new_country { 1 } else { 0 };
        if projected > 5 {
            return Ok(Some(Violation::new(
                self.rule_id(),
                format!("transacting across {projected} distinct countries"),
                0.65,
            )));
        }
        Ok(None)
    }
}
