//! In-process store implementations backed by `tokio::sync::RwLock`. Used by
//! the demo binary and by every test in the workspace; honor the exact same
//! contract as the Postgres-backed stores so property tests are
//! backend-agnostic.
mod event_log_store;
mod merchant_store;
mod profile_store;
mod transaction_store;

pub use event_log_store::InMemoryEventLogStore;
pub use merchant_store::InMemoryMerchantFrequencyStore;
pub use profile_store::InMemoryProfileStore;
pub use transaction_store::InMemoryTransactionStore;
