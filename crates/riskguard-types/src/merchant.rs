//! Per-user merchant category frequency tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantCategoryFrequency {
    pub user_id: String,
    pub category_frequencies: HashMap<String, i64>,
    pub last_updated: DateTime<Utc>,
}

impl MerchantCategoryFrequency {
    pub fn empty(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            category_frequencies: HashMap::new(),
            last_updated: now,
        }
    }

    pub fn count_for(&self, category: &str) -> i64 {
        self.category_frequencies.get(category).copied().unwrap_or(0)
    }

    /// Increment-by-one, the only mutation this aggregate ever sees.
    pub fn increment(&mut self, category: &str, now: DateTime<Utc>) {
        *self
            .category_frequencies
            .entry(category.to_string())
            .or_insert(0) += 1;
        self.last_updated = now;
    }
}
