use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use riskguard_types::{RiskGuardError, RiskGuardResult};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::MessageBus;

/// `rdkafka::producer::FutureProducer`-backed bus. Partitioned by the
/// supplied key (always the user id) so per-user ordering holds as long as
/// the topic's partition assignment is stable.
pub struct KafkaMessageBus {
    producer: FutureProducer,
}

impl KafkaMessageBus {
    pub fn new(brokers: &str) -> RiskGuardResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| RiskGuardError::BusPublish(format!("failed to create Kafka producer: {e}")))?;
        Ok(Self { producer })
    }
}

#[async_trait]
impl MessageBus for KafkaMessageBus {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: Value,
        timeout: Duration,
    ) -> RiskGuardResult<()> {
        let body = serde_json::to_vec(&payload)
            .map_err(|e| RiskGuardError::BusPublish(format!("payload encode failed: {e}")))?;
        let record = FutureRecord::to(topic).key(key).payload(&body);

        // Best-effort: a timeout or send error is logged and swallowed —
        // the event log append has already succeeded, so downstream state
        // reconciles through replay regardless of bus delivery.
        match self.producer.send(record, timeout).await {
            Ok(_) => Ok(()),
            Err((err, _)) => {
                warn!(topic, key, error = %err, "bus publish failed, relying on replay to reconcile");
                Err(RiskGuardError::BusPublish(err.to_string()))
            }
        }
    }
}
