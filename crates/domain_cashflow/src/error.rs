//! Cash-flow domain errors

use core_kernel::{PortError, TemporalError};
use thiserror::Error;

/// Errors that can occur while building projections or dashboards
///
/// The computations themselves are total; failures come from loading their
/// inputs or from a malformed period.
#[derive(Debug, Error)]
pub enum CashflowError {
    #[error("Invalid period: {0}")]
    InvalidPeriod(#[from] TemporalError),

    #[error("Invalid horizon: {0}")]
    InvalidHorizon(String),

    #[error("Source error: {0}")]
    Source(#[from] PortError),
}

impl CashflowError {
    /// Caller supplied a bad period or horizon
    pub fn is_validation(&self) -> bool {
        matches!(self, CashflowError::InvalidPeriod(_) | CashflowError::InvalidHorizon(_))
    }
}
