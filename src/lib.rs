//! Flat Match - apartment-to-tenant compatibility matching
//!
//! This library scores apartment listings against a tenant's search profile,
//! explains each score with a per-category breakdown, and ranks batches of
//! listings deterministically.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;

// Re-export commonly used types
pub use core::{MatchError, MatchRanker, DistanceProvider, HaversineProvider};
pub use models::{
    Listing, SearchProfile, MatchResult, Ranking, SkipRecord, WeightConfig, ScoringConstants,
    RankRequest, RankResponse,
};
