// Model exports
pub mod domain;
pub mod locale;
pub mod requests;
pub mod responses;

pub use domain::{
    Amenity, AmenityRequest, Category, CategoryBreakdown, Coordinates, Listing, ListingAmenities,
    MatchResult, Ranking, RawWeights, Reason, ScoringConstants, SearchProfile, SkipKind, SkipRecord,
    WeightConfig,
};
pub use locale::Locale;
pub use requests::{parse_listings, ExplainRequest, RankRequest};
pub use responses::{ErrorResponse, HealthResponse, MatchView, RankResponse};
