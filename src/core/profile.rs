use crate::core::error::MatchError;
use crate::models::{Amenity, AmenityRequest, Coordinates, SearchProfile};

/// Price bounds after normalization; either side may be open
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// A validated search profile
///
/// Built once per ranking call by [`normalize_profile`] and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProfile {
    city: Option<String>,
    price: Option<PriceRange>,
    desired_rooms: Option<u32>,
    amenities: AmenityRequest,
    coordinates: Option<Coordinates>,
}

impl NormalizedProfile {
    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn price(&self) -> Option<PriceRange> {
        self.price
    }

    /// `None` when the tenant has no room preference
    pub fn desired_rooms(&self) -> Option<u32> {
        self.desired_rooms
    }

    pub fn requested_amenities(&self) -> Vec<Amenity> {
        self.amenities.requested()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn wants_location(&self) -> bool {
        self.city.is_some() || self.coordinates.is_some()
    }

    pub fn wants_price(&self) -> bool {
        self.price.is_some()
    }

    pub fn wants_amenities(&self) -> bool {
        !self.amenities.requested().is_empty()
    }

    pub fn wants_size(&self) -> bool {
        self.desired_rooms.is_some()
    }
}

/// Validate a raw profile and fill in defaults
///
/// Ordering of the price bounds is checked before negative bounds are
/// clamped to zero, so `[-100, -50]` becomes `[0, 0]` while `[100, -50]`
/// is rejected.
pub fn normalize_profile(raw: &SearchProfile) -> Result<NormalizedProfile, MatchError> {
    for (name, bound) in [("priceMin", raw.price_min), ("priceMax", raw.price_max)] {
        if let Some(value) = bound {
            if !value.is_finite() {
                return Err(MatchError::InvalidProfile(format!(
                    "{} must be a finite number",
                    name
                )));
            }
        }
    }

    if let (Some(min), Some(max)) = (raw.price_min, raw.price_max) {
        if min > max {
            return Err(MatchError::InvalidProfile(format!(
                "priceMin ({}) is greater than priceMax ({})",
                min, max
            )));
        }
    }

    if let Some(coords) = raw.coordinates {
        if !coords.is_valid() {
            return Err(MatchError::InvalidProfile(
                "reference coordinates out of range".to_string(),
            ));
        }
    }

    let price = match (raw.price_min, raw.price_max) {
        (None, None) => None,
        (min, max) => Some(PriceRange {
            min: min.map(|v| v.max(0.0)),
            max: max.map(|v| v.max(0.0)),
        }),
    };

    let city = raw
        .city
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Ok(NormalizedProfile {
        city,
        price,
        desired_rooms: (raw.desired_rooms > 0).then_some(raw.desired_rooms),
        amenities: raw.desired_amenities,
        coordinates: raw.coordinates,
    })
}
