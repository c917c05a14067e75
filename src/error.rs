//! Closed error taxonomy for the valuation core.
//!
//! Every fallible library operation returns `Result<T, CoreError>`. The
//! variant set is deliberately closed: a new failure mode should map onto
//! one of these six, not grow the enum, per the exhaustive taxonomy this
//! system is built around.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A request field was missing, malformed, or out of its domain range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A comparable search or aggregate ran, but too few samples survived
    /// every filter to produce a trustworthy estimate.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// An investment calculation produced a non-positive interest price —
    /// fixed costs alone exceed the target sale price.
    #[error("costs exceed target price: {0}")]
    CostsExceedTarget(String),

    /// A downstream dependency (spatial store query, external collaborator
    /// call) did not respond inside its budget.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// The spatial store is unreachable or returned a connection-level
    /// failure.
    #[error("spatial store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    /// Address normalization could not converge; callers should fall back
    /// to the caller-supplied raw address rather than treat this as fatal.
    #[error("address normalization failed: {0}")]
    NormalizationFailed(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
