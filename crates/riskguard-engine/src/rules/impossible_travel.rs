use async_trait::async_trait;
use riskguard_types::{RiskGuardResult, Violation};

use crate::context::RuleContext;
use crate::haversine::distance_km;
use crate::rule::FraudRule;
use crate::thresholds::RuleThresholds;

pub struct ImpossibleTravelRule {
    jet_ceiling_kmh: f64,
}

impl ImpossibleTravelRule {
    pub fn new(jet_ceiling_kmh: f64) -> Self {
        Self { jet_ceiling_kmh }
    }
}

impl Default for ImpossibleTravelRule {
    fn default() -> Self {
        Self::new(RuleThresholds::default().impossible_travel_speed_kmh)
    }
}

#[async_trait]
impl FraudRule for ImpossibleTravelRule {
    fn rule_id(&self) -> &'static str {
        "IMPOSSIBLE_TRAVEL"
    }

    async fn evaluate(&self, ctx: &RuleContext<'_>) -> RiskGuardResult<Option<Violation>> {
        if !ctx.transaction.has_location() {
            return Ok(None);
        }
        let previous = ctx
            .transaction_store
            .previous_with_location(&ctx.transaction.user_id, ctx.transaction.id, ctx.transaction.created_at)
            .await?;
        let Some(previous) = previous else {
            return Ok(None);
        };
        let (lat1, lon1) = (previous.latitude.unwrap(), previous.longitude.unwrap());
        let (lat2, lon2) = (ctx.transaction.latitude.unwrap(), ctx.transaction.longitude.unwrap());
        let distance = distance_km(lat1, lon1, lat2, lon2);
        let elapsed_hours = (ctx.transaction.created_at - previous.created_at).num_seconds() as f64 / 3600.0;

        if elapsed_hours > 0.0 {
            let speed = distance / elapsed_hours;
            if speed > self.jet_ceiling_kmh {
                let risk_score = (0.5 + (speed - self.jet_ceiling_kmh) / 5000.0).min(1.0);
                return Ok(Some(Violation::new(
                    self.rule_id(),
                    format!("implied travel speed {speed:.0} km/h exceeds commercial jet ceiling"),
                    risk_score,
                )));
            }
        } else if distance > 500.0 {
            return Ok(Some(Violation::new(
                self.rule_id(),
                format!("{distance:.0} km apart with no elapsed time"),
                0.95,
            )));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use riskguard_store::memory::InMemoryTransactionStore;
    use riskguard_store::TransactionStore;
    use riskguard_types::{TransactionRequest, TransactionType};

    use super::*;
    use crate::rule::FraudRule;
    use crate::rules::test_support::{amount, empty_merchant_frequency, profile_with_total_transactions, transaction};

    #[tokio::test]
    async fn flags_new_york_to_london_in_two_hours() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let t0 = Utc::now() - Duration::days(1);
        let mut prior = TransactionRequest::new("u1", amount("80.00"), "USD", TransactionType::Purchase);
        prior.created_at = Some(t0);
        prior.latitude = Some(40.7128);
        prior.longitude = Some(-74.0060);
        store.save(prior).await.unwrap();

        let mut tx = transaction("u1", "100.00", t0 + Duration::hours(2));
        tx.latitude = Some(51.5074);
        tx.longitude = Some(-0.1278);
        let profile = profile_with_total_transactions(5);
        let freq = empty_merchant_frequency();
        let ctx = RuleContext {
            transaction: &tx,
            profile: &profile,
            merchant_frequency: &freq,
            transaction_store: store,
        };
        let violation = ImpossibleTravelRule::default().evaluate(&ctx).await.unwrap().unwrap();
        assert!(violation.risk_score > 0.5);
    }

    #[tokio::test]
    async fn ignores_transaction_without_location() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let tx = transaction("u1", "100.00", Utc::now());
        let profile = profile_with_total_transactions(5);
        let freq = empty_merchant_frequency();
        let ctx = RuleContext {
            transaction: &tx,
            profile: &profile,
            merchant_frequency: &freq,
            transaction_store: store,
        };
        assert!(ImpossibleTravelRule::default().evaluate(&ctx).await.unwrap().is_none());
    }
}
