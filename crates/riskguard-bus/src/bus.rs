use async_trait::async_trait;
use riskguard_types::RiskGuardResult;
use serde_json::Value;
use std::time::Duration;

/// Partitioned pub/sub with keyed ordering. Producers are fire-and-forget
/// within a bounded timeout: a failure here is always absorbed by the
/// caller, never surfaced as a request failure, since the event log has
/// already durably recorded the fact being published.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: Value,
        timeout: Duration,
    ) -> RiskGuardResult<()>;
}
