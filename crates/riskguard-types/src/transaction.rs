//! Transaction model: the immutable record of a single payment event.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::RiskGuardError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Purchase,
    Transfer,
    Withdrawal,
    Deposit,
    Refund,
}

/// Transaction as submitted by the caller, before `TransactionStore::save`
/// has assigned the fields that only the store may assign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub id: Option<Uuid>,
    pub user_id: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub created_at: Option<DateTime<Utc>>,
    pub transaction_type: TransactionType,
    pub merchant_category: Option<String>,
    pub merchant_name: Option<String>,
    pub is_international: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub ip_address: Option<String>,
}

impl TransactionRequest {
    pub fn new(
        user_id: impl Into<String>,
        amount: impl Into<BigDecimal>,
        currency: impl Into<String>,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            amount: amount.into(),
            currency: currency.into(),
            created_at: None,
            transaction_type,
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

    /// Validate the domain invariants (amount bounds, currency code shape,
    /// coordinate ranges, country code shape). Called by
    /// `TransactionStore::save` before persistence.
    pub fn validate(&self) -> Result<(), RiskGuardError> {
        let min = BigDecimal::from_str("0.01").expect("static literal parses");
        let max = BigDecimal::from_str("1000000").expect("static literal parses");
        if self.amount < min || self.amount > max {
            return Err(RiskGuardError::Validation(format!(
                "amount {} outside allowed range [0.01, 1000000]",
                self.amount
            )));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(RiskGuardError::Validation(format!(
                "currency {:?} is not a 3-letter ISO 4217 code",
                self.currency
            )));
        }
        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(RiskGuardError::Validation(format!(
                    "latitude {lat} outside [-90, 90]"
                )));
            }
        }
        if let Some(lon) = self.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(RiskGuardError::Validation(format!(
                    "longitude {lon} outside [-180, 180]"
                )));
            }
        }
        if let Some(country) = &self.country {
            if country.len() != 2 || !country.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(RiskGuardError::Validation(format!(
                    "country {country:?} is not a 2-letter ISO 3166-1 alpha-2 code"
                )));
            }
        }
        Ok(())
    }
}

/// Transaction as persisted by `TransactionStore`. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub transaction_type: TransactionType,
    pub merchant_category: Option<String>,
    pub merchant_name: Option<String>,
    pub is_international: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub ip_address: Option<String>,
}

impl Transaction {
    /// Materialize a persisted transaction from a validated request, filling
    /// in `id`/`created_at` exactly as `TransactionStore::save` is required to.
    pub fn from_request(req: TransactionRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: req.id.unwrap_or_else(Uuid::new_v4),
            user_id: req.user_id,
            amount: req.amount,
            currency: req.currency,
            created_at: req.created_at.unwrap_or(now),
            transaction_type: req.transaction_type,
            merchant_category: req.merchant_category,
            merchant_name: req.merchant_name,
            is_international: req.is_international,
            latitude: req.latitude,
            longitude: req.longitude,
            country: req.country,
            city: req.city,
            ip_address: req.ip_address,
        }
    }

    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}
