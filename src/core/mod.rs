// Core algorithm exports
pub mod aggregate;
pub mod distance;
pub mod error;
pub mod matcher;
pub mod profile;
pub mod reasons;
pub mod scoring;

pub use aggregate::{aggregate, Aggregate};
pub use distance::{haversine_distance, DistanceCache, DistanceProvider, HaversineProvider};
pub use error::MatchError;
pub use matcher::{default_workers, MatchRanker};
pub use profile::{normalize_profile, NormalizedProfile, PriceRange};
pub use reasons::generate_reasons;
pub use scoring::score_categories;
