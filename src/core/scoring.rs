use crate::core::distance::DistanceProvider;
use crate::core::profile::{NormalizedProfile, PriceRange};
use crate::models::{Amenity, Category, CategoryBreakdown, Listing, ListingAmenities, ScoringConstants};

/// Sub-score used when the listing lacks the data a scorer needs
pub const NEUTRAL_SCORE: u8 = 50;

/// Run every scorer the profile has an interest in
///
/// Categories the tenant expressed no preference for are left out of the
/// breakdown entirely rather than scored as zero.
pub fn score_categories(
    profile: &NormalizedProfile,
    listing: &Listing,
    distance: Option<&dyn DistanceProvider>,
    constants: &ScoringConstants,
) -> CategoryBreakdown {
    let mut breakdown = CategoryBreakdown::new();

    if profile.wants_location() {
        breakdown.insert(
            Category::Location,
            location_score(profile, listing, distance, constants),
        );
    }

    if let Some(range) = profile.price() {
        breakdown.insert(Category::Price, price_score(range, listing.price));
    }

    if let Some(score) = amenities_score(&profile.requested_amenities(), &listing.amenities) {
        breakdown.insert(Category::Amenities, score);
    }

    if let Some(desired_rooms) = profile.desired_rooms() {
        breakdown.insert(
            Category::Size,
            size_score(desired_rooms, listing.rooms, listing.size, constants),
        );
    }

    breakdown
}

/// Price score (0-100)
///
/// 100 inside the range, then linear decay with the overage relative to the
/// width of the range. A price outside the range never rounds up to 100.
pub fn price_score(range: PriceRange, price: Option<f64>) -> u8 {
    let Some(price) = price else {
        return NEUTRAL_SCORE;
    };

    let min = range.min.unwrap_or(0.0);
    let within_max = range.max.map_or(true, |max| price <= max);
    if price >= min && within_max {
        return 100;
    }

    let overage = if price < min {
        min - price
    } else {
        // within_max is false, so max is present
        price - range.max.unwrap_or(price)
    };

    let span = match range.max {
        Some(max) => (max - min).max(1.0),
        None => min.max(1.0),
    };

    let score = (100.0 - 100.0 * overage / span).max(0.0);
    to_sub_score(score).min(99)
}

/// Location score (0-100)
///
/// Same city wins outright; otherwise distance decides when both sides have
/// coordinates and a provider is available. Anything else is neutral.
pub fn location_score(
    profile: &NormalizedProfile,
    listing: &Listing,
    distance: Option<&dyn DistanceProvider>,
    constants: &ScoringConstants,
) -> u8 {
    if let (Some(wanted), Some(city)) = (profile.city(), listing.city.as_deref()) {
        if wanted.to_lowercase() == city.trim().to_lowercase() {
            return 100;
        }
    }

    let (Some(from), Some(to), Some(provider)) =
        (profile.coordinates(), listing.coordinates, distance)
    else {
        return NEUTRAL_SCORE;
    };

    match provider.distance_km(from, to) {
        Ok(km) if km.is_finite() => to_sub_score(100.0 - constants.km_penalty * km.max(0.0)),
        Ok(km) => {
            tracing::debug!("Ignoring non-finite distance {} for listing {}", km, listing.id);
            NEUTRAL_SCORE
        }
        Err(e) => {
            tracing::debug!("Falling back to neutral location score for {}: {}", listing.id, e);
            NEUTRAL_SCORE
        }
    }
}

/// Amenities score (0-100), `None` when nothing was requested
///
/// Flags the listing doesn't state count as unmatched, unless the listing
/// states none of the requested flags at all.
pub fn amenities_score(requested: &[Amenity], amenities: &ListingAmenities) -> Option<u8> {
    if requested.is_empty() {
        return None;
    }

    let known = requested
        .iter()
        .filter(|a| amenities.get(**a).is_some())
        .count();
    if known == 0 {
        return Some(NEUTRAL_SCORE);
    }

    let matched = requested
        .iter()
        .filter(|a| amenities.get(**a) == Some(true))
        .count();

    Some(to_sub_score(100.0 * matched as f64 / requested.len() as f64))
}

/// Size score (0-100): mean of the room fit and floor-area fit that could be evaluated
pub fn size_score(
    desired_rooms: u32,
    rooms: Option<u32>,
    size: Option<f64>,
    constants: &ScoringConstants,
) -> u8 {
    let components: Vec<f64> = [
        rooms.map(|r| room_fit(desired_rooms, r, constants)),
        size.map(|s| area_fit(desired_rooms, s, constants)),
    ]
    .into_iter()
    .flatten()
    .collect();

    if components.is_empty() {
        return NEUTRAL_SCORE;
    }

    to_sub_score(components.iter().sum::<f64>() / components.len() as f64)
}

#[inline]
fn room_fit(desired: u32, rooms: u32, constants: &ScoringConstants) -> f64 {
    match desired.abs_diff(rooms) {
        0 => 100.0,
        1 => constants.room_off_by_one,
        delta => (100.0 - constants.room_step_penalty * delta as f64).max(0.0),
    }
}

/// Area fit against `desired * area_per_room` with a relative tolerance band;
/// decays linearly to zero at twice the band
#[inline]
fn area_fit(desired: u32, size: f64, constants: &ScoringConstants) -> f64 {
    let baseline = constants.area_per_room * desired as f64;
    let band = baseline * constants.area_tolerance;
    let deviation = (size - baseline).abs();

    if deviation <= band {
        return 100.0;
    }
    if band <= 0.0 {
        return 0.0;
    }

    (100.0 * (1.0 - (deviation - band) / band)).max(0.0)
}

#[inline]
fn to_sub_score(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
