use riskguard_store::TransactionStore;
use riskguard_types::{MerchantCategoryFrequency, RiskProfile, Transaction};
use std::sync::Arc;

/// Everything a rule needs to evaluate one transaction: the transaction
/// itself, a snapshot of the user's profile and merchant frequency taken
/// before this transaction's effects are folded in, and read-only access to
/// the transaction store for look-backs (velocity, geography, statistics).
pub struct RuleContext<'a> {
    pub transaction: &'a Transaction,
    pub profile: &'a RiskProfile,
    pub merchant_frequency: &'a MerchantCategoryFrequency,
    pub transaction_store: Arc<dyn TransactionStore>,
}
