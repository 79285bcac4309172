use thiserror::Error;

/// Errors produced by the matching engine
///
/// Only `InvalidProfile` aborts a ranking call. `InvalidListing` is turned
/// into a skip record, and `DistanceUnavailable` makes the location scorer
/// fall back to its neutral score.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid listing {id}: {reason}")]
    InvalidListing { id: String, reason: String },

    #[error("Distance unavailable: {0}")]
    DistanceUnavailable(String),

    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
}
