//! Configuration errors.

use thiserror::Error;

/// Reasons an [`EngineParams`](crate::EngineParams) set is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("consensus threshold must be in (5000, 10000] bps, got {0}")]
    ThresholdOutOfRange(u32),

    #[error("reputation bounds are inverted: min {min} > max {max}")]
    InvertedReputationBounds { min: i64, max: i64 },

    #[error("initial reputation {initial} lies outside [{min}, {max}]")]
    InitialReputationOutOfBounds { initial: i64, min: i64, max: i64 },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("{name} of {value}s exceeds the maximum of {max}s")]
    WindowTooLong { name: &'static str, value: u64, max: u64 },

    #[error("{name} must be at most 10000 bps, got {value}")]
    BpsOutOfRange { name: &'static str, value: u32 },

    #[error("minimum bond must be greater than zero")]
    ZeroMinimumBond,

    #[error("reward pool identity must not be empty")]
    EmptyRewardPool,
}
