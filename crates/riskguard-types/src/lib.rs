// Domain types shared across the risk pipeline.
pub mod error;
pub mod event;
pub mod fraud;
pub mod merchant;
pub mod profile;
pub mod transaction;

pub use error::{RiskGuardError, RiskGuardResult};
pub use event::{AggregateType, EventLogEntry, EventType};
pub use fraud::{FraudAssessment, FraudDecision, Violation};
pub use merchant::MerchantCategoryFrequency;
pub use profile::{RiskLevel, RiskProfile, RiskTrend, UserType};
pub use transaction::{Transaction, TransactionRequest, TransactionType};
