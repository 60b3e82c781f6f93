//! Error taxonomy shared by every RiskGuard crate.
//!
//! One enum, one reason string per variant, covering the five failure
//! classes this pipeline distinguishes. A block decision is a normal `Ok`
//! outcome, not an error, so there is no `FraudBlock` variant here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskGuardError {
    /// Input does not satisfy the domain invariants (amount bounds, currency
    /// code shape, coordinate ranges, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A store append/read failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Publishing to the message bus failed or timed out.
    #[error("bus publish failure: {0}")]
    BusPublish(String),

    /// Rule evaluation or projection folding failed.
    #[error("evaluation failure: {0}")]
    Evaluation(String),

    /// An as-of timestamp or aggregate reference used for replay was invalid.
    #[error("invalid replay input: {0}")]
    ReplayInput(String),
}

pub type RiskGuardResult<T> = Result<T, RiskGuardError>;
