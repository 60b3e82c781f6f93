//! Bus topic names. Partition count is deployment-configurable; only the
//! key (always the user id) needs to be stable for per-user ordering.

pub const TRANSACTION_CREATED: &str = "transaction-created";
pub const FRAUD_DETECTED: &str = "fraud-detected";
pub const FRAUD_CLEARED: &str = "fraud-cleared";
pub const TRANSACTION_BLOCKED: &str = "transaction-blocked";
pub const USER_PROFILE_UPDATED: &str = "user-profile-updated";
pub const HIGH_RISK_USER: &str = "high-risk-user";
