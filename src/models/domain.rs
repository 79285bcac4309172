use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::error::MatchError;

/// Geographic point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Both components finite and within the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Amenity vocabulary shared by profiles and listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Amenity {
    PetsAllowed,
    Furnished,
    Balcony,
}

impl Amenity {
    pub const ALL: [Amenity; 3] = [Amenity::PetsAllowed, Amenity::Furnished, Amenity::Balcony];
}

/// Amenities a tenant explicitly asks for (`true` = requested)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmenityRequest {
    #[serde(default)]
    pub pets_allowed: bool,
    #[serde(default)]
    pub furnished: bool,
    #[serde(default)]
    pub balcony: bool,
}

impl AmenityRequest {
    pub fn requests(&self, amenity: Amenity) -> bool {
        match amenity {
            Amenity::PetsAllowed => self.pets_allowed,
            Amenity::Furnished => self.furnished,
            Amenity::Balcony => self.balcony,
        }
    }

    /// Requested amenities in vocabulary order
    pub fn requested(&self) -> Vec<Amenity> {
        Amenity::ALL
            .into_iter()
            .filter(|a| self.requests(*a))
            .collect()
    }
}

/// Amenity flags as stated on a listing; `None` means the listing doesn't say
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingAmenities {
    #[serde(default)]
    pub pets_allowed: Option<bool>,
    #[serde(default)]
    pub furnished: Option<bool>,
    #[serde(default)]
    pub balcony: Option<bool>,
}

impl ListingAmenities {
    pub fn get(&self, amenity: Amenity) -> Option<bool> {
        match amenity {
            Amenity::PetsAllowed => self.pets_allowed,
            Amenity::Furnished => self.furnished,
            Amenity::Balcony => self.balcony,
        }
    }
}

/// Tenant search preferences as received from the client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProfile {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    /// 0 means "any number of rooms"
    #[serde(default)]
    pub desired_rooms: u32,
    #[serde(default)]
    pub desired_amenities: AmenityRequest,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// A single apartment record being scored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    #[serde(default)]
    pub price: Option<f64>,
    /// Floor area in square meters
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub rooms: Option<u32>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub amenities: ListingAmenities,
    #[serde(default)]
    pub is_new: bool,
}

impl Listing {
    /// Check the listing's own invariants before it is scored
    pub fn validate(&self) -> Result<(), MatchError> {
        let invalid = |reason: &str| MatchError::InvalidListing {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("listing id is empty"));
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(invalid("price must be a non-negative number"));
            }
        }
        if let Some(size) = self.size {
            if !size.is_finite() || size <= 0.0 {
                return Err(invalid("size must be a positive number"));
            }
        }
        if let Some(coords) = self.coordinates {
            if !coords.is_valid() {
                return Err(invalid("coordinates out of range"));
            }
        }

        Ok(())
    }
}

/// Scoring categories, declared in reason priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Location,
    Price,
    Amenities,
    Size,
}

impl Category {
    pub const PRIORITY: [Category; 4] = [
        Category::Location,
        Category::Price,
        Category::Amenities,
        Category::Size,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Location => "location",
            Category::Price => "price",
            Category::Amenities => "amenities",
            Category::Size => "size",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category sub-scores; a missing key means the category was not evaluated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Category, u8>", into = "BTreeMap<Category, u8>")]
pub struct CategoryBreakdown(BTreeMap<Category, u8>);

impl TryFrom<BTreeMap<Category, u8>> for CategoryBreakdown {
    type Error = String;

    fn try_from(scores: BTreeMap<Category, u8>) -> Result<Self, Self::Error> {
        if let Some((category, score)) = scores.iter().find(|(_, score)| **score > 100) {
            return Err(format!("{} sub-score must be at most 100, got {}", category, score));
        }
        Ok(Self(scores))
    }
}

impl From<CategoryBreakdown> for BTreeMap<Category, u8> {
    fn from(breakdown: CategoryBreakdown) -> Self {
        breakdown.0
    }
}

impl CategoryBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: Category, score: u8) {
        self.0.insert(category, score.min(100));
    }

    pub fn get(&self, category: Category) -> Option<u8> {
        self.0.get(&category).copied()
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains_key(&category)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Evaluated categories in priority order
    pub fn iter(&self) -> impl Iterator<Item = (Category, u8)> + '_ {
        self.0.iter().map(|(c, s)| (*c, *s))
    }
}

/// Locale-agnostic explanation attached to a high-scoring category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    PreferredLocation,
    WithinBudget,
    AmenitiesMatch,
    SizeFits,
}

impl Reason {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Location => Reason::PreferredLocation,
            Category::Price => Reason::WithinBudget,
            Category::Amenities => Reason::AmenitiesMatch,
            Category::Size => Reason::SizeFits,
        }
    }
}

/// Outcome of scoring one listing against one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub listing_id: String,
    pub score: u8,
    pub breakdown: CategoryBreakdown,
    pub reasons: Vec<Reason>,
    /// Set when no weighted category could be evaluated and the score is the neutral default
    pub degenerate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipKind {
    InvalidListing,
    /// The scoring task itself failed (e.g. panicked)
    ScoringFailed,
}

/// A listing left out of a ranking, with the reason it was left out
///
/// Orders by listing id first so skip lists read the same on every run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipRecord {
    pub listing_id: String,
    pub kind: SkipKind,
    pub detail: String,
}

/// Result of ranking a batch of listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub matches: Vec<MatchResult>,
    pub skipped: Vec<SkipRecord>,
    pub total_candidates: usize,
    /// True when the ranking stopped early and `matches` is partial
    pub cancelled: bool,
}

impl Ranking {
    /// Fold in listings that were rejected before they reached the ranker
    ///
    /// They count as candidates and join `skipped` in the usual order.
    pub fn with_rejected(mut self, rejected: Vec<SkipRecord>) -> Self {
        if rejected.is_empty() {
            return self;
        }
        self.total_candidates += rejected.len();
        self.skipped.extend(rejected);
        self.skipped.sort();
        self
    }
}

/// Raw weight values, checked by [`WeightConfig::new`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWeights {
    pub location: f64,
    pub price: f64,
    pub amenities: f64,
    pub size: f64,
}

/// Per-category weights; need not sum to anything in particular
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeights", into = "RawWeights")]
pub struct WeightConfig {
    location: f64,
    price: f64,
    amenities: f64,
    size: f64,
}

impl WeightConfig {
    pub fn new(location: f64, price: f64, amenities: f64, size: f64) -> Result<Self, MatchError> {
        for (category, weight) in [
            (Category::Location, location),
            (Category::Price, price),
            (Category::Amenities, amenities),
            (Category::Size, size),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(MatchError::InvalidWeights(format!(
                    "{} weight must be a non-negative number, got {}",
                    category, weight
                )));
            }
        }

        Ok(Self {
            location,
            price,
            amenities,
            size,
        })
    }

    pub fn weight(&self, category: Category) -> f64 {
        match category {
            Category::Location => self.location,
            Category::Price => self.price,
            Category::Amenities => self.amenities,
            Category::Size => self.size,
        }
    }
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            location: 30.0,
            price: 35.0,
            amenities: 15.0,
            size: 20.0,
        }
    }
}

impl TryFrom<RawWeights> for WeightConfig {
    type Error = MatchError;

    fn try_from(raw: RawWeights) -> Result<Self, Self::Error> {
        Self::new(raw.location, raw.price, raw.amenities, raw.size)
    }
}

impl From<WeightConfig> for RawWeights {
    fn from(weights: WeightConfig) -> Self {
        Self {
            location: weights.location,
            price: weights.price,
            amenities: weights.amenities,
            size: weights.size,
        }
    }
}

/// Tunable decay constants used by the category scorers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConstants {
    /// Location points lost per kilometer of distance
    pub km_penalty: f64,
    /// Expected floor area per desired room (m²)
    pub area_per_room: f64,
    /// Accepted relative deviation from the area baseline
    pub area_tolerance: f64,
    /// Room score when the count is off by exactly one
    pub room_off_by_one: f64,
    /// Room points lost per room of difference beyond one
    pub room_step_penalty: f64,
    /// Minimum sub-score that produces a reason
    pub reason_threshold: u8,
}

impl Default for ScoringConstants {
    fn default() -> Self {
        Self {
            km_penalty: 5.0,
            area_per_room: 25.0,
            area_tolerance: 0.4,
            room_off_by_one: 70.0,
            room_step_penalty: 30.0,
            reason_threshold: 80,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_rejects_out_of_range_scores() {
        let ok: CategoryBreakdown = serde_json::from_str(r#"{"price":80,"size":100}"#).unwrap();
        assert_eq!(ok.get(Category::Price), Some(80));
        assert_eq!(ok.get(Category::Size), Some(100));

        let err = serde_json::from_str::<CategoryBreakdown>(r#"{"price":101}"#).unwrap_err();
        assert!(err.to_string().contains("at most 100"), "{}", err);
    }

    #[test]
    fn test_ranking_with_rejected() {
        let ranking = Ranking {
            matches: vec![],
            skipped: vec![SkipRecord {
                listing_id: "m".to_string(),
                kind: SkipKind::InvalidListing,
                detail: "price must be a non-negative number".to_string(),
            }],
            total_candidates: 3,
            cancelled: false,
        };

        let merged = ranking.with_rejected(vec![SkipRecord {
            listing_id: "b".to_string(),
            kind: SkipKind::InvalidListing,
            detail: "invalid type".to_string(),
        }]);

        assert_eq!(merged.total_candidates, 4);
        let ids: Vec<&str> = merged.skipped.iter().map(|s| s.listing_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "m"]);
    }

    #[test]
    fn test_weights_reject_negative() {
        assert!(WeightConfig::new(1.0, -0.5, 1.0, 1.0).is_err());
        assert!(WeightConfig::new(1.0, f64::NAN, 1.0, 1.0).is_err());
        assert!(WeightConfig::new(0.0, 0.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_weights_deserialize_through_validation() {
        let ok: WeightConfig =
            serde_json::from_str(r#"{"location":1,"price":2,"amenities":3,"size":4}"#).unwrap();
        assert_eq!(ok.weight(Category::Amenities), 3.0);

        let bad = serde_json::from_str::<WeightConfig>(
            r#"{"location":1,"price":-2,"amenities":3,"size":4}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_breakdown_serializes_lowercase_keys() {
        let mut breakdown = CategoryBreakdown::new();
        breakdown.insert(Category::Size, 70);
        breakdown.insert(Category::Location, 100);

        let json = serde_json::to_string(&breakdown).unwrap();
        assert_eq!(json, r#"{"location":100,"size":70}"#);
        assert!(!breakdown.contains(Category::Amenities));
    }

    #[test]
    fn test_listing_validation() {
        let mut listing = Listing {
            id: "l1".to_string(),
            price: Some(900.0),
            ..Default::default()
        };
        assert!(listing.validate().is_ok());

        listing.price = Some(-1.0);
        assert!(matches!(
            listing.validate(),
            Err(MatchError::InvalidListing { .. })
        ));

        listing.price = Some(900.0);
        listing.size = Some(0.0);
        assert!(listing.validate().is_err());

        listing.size = None;
        listing.coordinates = Some(Coordinates::new(95.0, 10.0));
        assert!(listing.validate().is_err());
    }

    #[test]
    fn test_amenity_request_order() {
        let request = AmenityRequest {
            pets_allowed: false,
            furnished: true,
            balcony: true,
        };
        assert_eq!(request.requested(), vec![Amenity::Furnished, Amenity::Balcony]);
    }
}
