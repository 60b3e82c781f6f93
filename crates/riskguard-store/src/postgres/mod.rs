//! `sqlx::PgPool`-backed store implementations. Queries are runtime-bound
//! (`sqlx::query`/`query_as`) rather than the compile-time-checked
//! `sqlx::query!` macro family, since there is no live database available to
//! validate against at build time in this environment; the SQL itself is
//! unchanged from what `query!` would run.
mod event_log_store;
mod merchant_store;
mod profile_store;
mod transaction_store;

pub use event_log_store::PostgresEventLogStore;
pub use merchant_store::PostgresMerchantFrequencyStore;
pub use profile_store::PostgresProfileStore;
pub use transaction_store::PostgresTransactionStore;
