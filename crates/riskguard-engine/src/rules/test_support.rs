//! Fixture builders shared by the per-rule unit tests in this module. Not
//! compiled outside `#[cfg(test)]`.

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use riskguard_store::memory::InMemoryTransactionStore;
use riskguard_store::TransactionStore;
use riskguard_types::{MerchantCategoryFrequency, RiskProfile, Transaction, TransactionRequest, TransactionType};
use uuid::Uuid;

pub fn amount(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

pub fn profile_with_total_transactions(total: i64) -> RiskProfile {
    let mut p = RiskProfile::initial("u1", Utc::now());
    p.total_transactions = total;
    p
}

pub fn empty_merchant_frequency() -> MerchantCategoryFrequency {
    MerchantCategoryFrequency::empty("u1", Utc::now())
}

/// Builds a transaction (not persisted) with the given amount, optionally at
/// a specific point in time and location.
pub fn transaction(user_id: &str, amount_str: &str, created_at: DateTime<Utc>) -> Transaction {
    Transaction {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        amount: amount(amount_str),
        currency: "USD".to_string(),
        created_at,
        transaction_type: TransactionType::Purchase,
        merchant_category: None,
        merchant_name: None,
        is_international: false,
        latitude: None,
        longitude: None,
        country: None,
        city: None,
        ip_address: None,
    }
}

/// Persists `n` transactions of `amount_str` for `user_id`, evenly spaced
/// back from `anchor`, and returns the backing store for use as a
/// `RuleContext::transaction_store`.
pub async fn store_with_history(
    user_id: &str,
    amount_str: &str,
    anchor: DateTime<Utc>,
    n: i64,
    spacing: chrono::Duration,
) -> Arc<dyn TransactionStore> {
    let store = Arc::new(InMemoryTransactionStore::new());
    for i in 0..n {
        let mut req = TransactionRequest::new(user_id, amount(amount_str), "USD", TransactionType::Purchase);
        req.created_at = Some(anchor - spacing * ((n - i) as i32));
        store.save(req).await.unwrap();
    }
    store
}

pub fn empty_store() -> Arc<dyn TransactionStore> {
    Arc::new(InMemoryTransactionStore::new())
}
