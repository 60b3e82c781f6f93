//! RiskGuard: the real-time transaction risk-assessment pipeline.
//!
//! This crate wires the domain crates (`riskguard-types`, `riskguard-store`,
//! `riskguard-bus`, `riskguard-engine`, `riskguard-projection`) into the
//! orchestration that runs it end to end: `TransactionWorkflow`. It is a
//! library first — the `riskguard-cli` binary is demo/test tooling that
//! exercises the pipeline locally, not a controller surface.

pub mod config;
pub mod stripe_lock;
pub mod workflow;

pub use config::{Environment, RiskGuardConfig};
pub use workflow::TransactionWorkflow;

/// Wires an in-memory store/bus stack behind the workflow — the backend used
/// by the CLI demo and by every integration test in `tests/`, so that the
/// same assembly code exercises the same pipeline the Postgres/Kafka
/// deployment would run.
pub mod harness {
    use std::sync::Arc;

    use riskguard_bus::InMemoryMessageBus;
    use riskguard_engine::RuleEngine;
    use riskguard_store::memory::{
        InMemoryEventLogStore, InMemoryMerchantFrequencyStore, InMemoryProfileStore, InMemoryTransactionStore,
    };

    use crate::config::RiskGuardConfig;
    use crate::workflow::TransactionWorkflow;

    /// Everything an integration test or the CLI demo needs: the workflow
    /// plus direct handles to the backing stores and bus for assertions.
    pub struct InMemoryHarness {
        pub workflow: TransactionWorkflow,
        pub transactions: Arc<InMemoryTransactionStore>,
        pub events: Arc<InMemoryEventLogStore>,
        pub profiles: Arc<InMemoryProfileStore>,
        pub merchant_frequency: Arc<InMemoryMerchantFrequencyStore>,
        pub bus: Arc<InMemoryMessageBus>,
    }

    pub fn build(config: RiskGuardConfig) -> InMemoryHarness {
        let transactions = Arc::new(InMemoryTransactionStore::new());
        let events = Arc::new(InMemoryEventLogStore::new());
        let profiles = Arc::new(InMemoryProfileStore::new());
        let merchant_frequency = Arc::new(InMemoryMerchantFrequencyStore::new());
        let bus = Arc::new(InMemoryMessageBus::new());
        let engine = Arc::new(RuleEngine::new(config.rule_thresholds()));

        let workflow = TransactionWorkflow::new(
            transactions.clone(),
            events.clone(),
            profiles.clone(),
            merchant_frequency.clone(),
            bus.clone(),
            engine,
            config,
        );

        InMemoryHarness {
            workflow,
            transactions,
            events,
            profiles,
            merchant_frequency,
            bus,
        }
    }

    pub fn build_default() -> InMemoryHarness {
        build(RiskGuardConfig::default())
    }
}
