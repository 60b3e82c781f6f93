use async_trait::async_trait;
use dashmap::DashMap;
use riskguard_types::RiskGuardResult;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::MessageBus;

/// `tokio::sync::broadcast` channel per topic. Used by tests and the CLI
/// demo. Per-key ordering within a process is preserved because there is
/// only ever one producer task per user (guarded by the caller's per-user
/// mutex).
pub struct InMemoryMessageBus {
    channels: DashMap<String, broadcast::Sender<(String, Value)>>,
    capacity: usize,
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            capacity: 1024,
        }
    }

    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<(String, Value)> {
        self.channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: Value,
        _timeout: Duration,
    ) -> RiskGuardResult<()> {
        let sender = self
            .channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        // No active subscribers is not an error: at-least-once delivery
        // only matters to consumers that exist.
        let _ = sender.send((key.to_string(), payload));
        Ok(())
    }
}
