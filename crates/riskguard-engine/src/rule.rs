use async_trait::async_trait;
use riskguard_types::{RiskGuardResult, Violation};

use crate::context::RuleContext;

/// A single, side-effect-free fraud check. Rules share no mutable state with
/// each other, so adding or removing one is always a local change.
#[async_trait]
pub trait FraudRule: Send + Sync {
    fn rule_id(&self) -> &'static str;

    fn is_active(&self) -> bool {
        true
    }

    async fn evaluate(&self, ctx: &RuleContext<'_>) -> RiskGuardResult<Option<Violation>>;
}
