// Integration tests for Flat Match

use flat_match::core::{DistanceProvider, HaversineProvider, MatchError, MatchRanker};
use flat_match::models::{
    AmenityRequest, Category, Coordinates, Listing, ListingAmenities, Reason, SearchProfile,
    SkipKind, WeightConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn create_test_profile() -> SearchProfile {
    SearchProfile {
        city: Some("Berlin".to_string()),
        price_min: Some(800.0),
        price_max: Some(1200.0),
        desired_rooms: 2,
        desired_amenities: AmenityRequest {
            pets_allowed: true,
            ..Default::default()
        },
        coordinates: None,
    }
}

fn create_test_listing(id: &str, price: f64, city: &str, pets: bool, size: f64) -> Listing {
    Listing {
        id: id.to_string(),
        price: Some(price),
        size: Some(size),
        rooms: Some(2),
        city: Some(city.to_string()),
        coordinates: None,
        amenities: ListingAmenities {
            pets_allowed: Some(pets),
            ..Default::default()
        },
        is_new: false,
    }
}

/// Distance provider that counts how often it is consulted
struct CountingProvider {
    calls: AtomicUsize,
}

impl DistanceProvider for CountingProvider {
    fn distance_km(&self, a: Coordinates, b: Coordinates) -> Result<f64, MatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        HaversineProvider.distance_km(a, b)
    }
}

#[test]
fn test_integration_perfect_match() {
    let ranker = MatchRanker::with_default_constants();
    let listing = create_test_listing("berlin", 1000.0, "Berlin", true, 55.0);

    let result = ranker
        .explain(&create_test_profile(), &listing, &WeightConfig::default())
        .unwrap();

    assert_eq!(result.breakdown.get(Category::Price), Some(100));
    assert_eq!(result.breakdown.get(Category::Amenities), Some(100));
    assert_eq!(result.breakdown.get(Category::Size), Some(100));
    assert_eq!(result.breakdown.get(Category::Location), Some(100));
    assert_eq!(result.score, 100);
    assert_eq!(
        result.reasons,
        vec![
            Reason::PreferredLocation,
            Reason::WithinBudget,
            Reason::AmenitiesMatch,
            Reason::SizeFits,
        ]
    );
}

#[test]
fn test_integration_poor_match() {
    let ranker = MatchRanker::with_default_constants();
    let listing = create_test_listing("munich", 1500.0, "Munich", false, 50.0);

    let result = ranker
        .explain(&create_test_profile(), &listing, &WeightConfig::default())
        .unwrap();

    assert!(result.breakdown.get(Category::Price).unwrap() < 100);
    assert_eq!(result.breakdown.get(Category::Location), Some(50));
    assert_eq!(result.breakdown.get(Category::Amenities), Some(0));
    assert!(result.score < 60, "Expected a weak match, got {}", result.score);
    assert!(result.reasons.len() <= 1);
}

#[test]
fn test_rank_is_idempotent() {
    let ranker = MatchRanker::with_default_constants()
        .with_distance_provider(Arc::new(HaversineProvider));
    let mut profile = create_test_profile();
    profile.coordinates = Some(Coordinates::new(52.52, 13.405));

    let listings: Vec<Listing> = (0..40)
        .map(|i| {
            let mut listing = create_test_listing(
                &format!("l{}", i),
                600.0 + (i as f64 * 53.0) % 1000.0,
                if i % 2 == 0 { "Berlin" } else { "Potsdam" },
                i % 3 == 0,
                35.0 + i as f64,
            );
            listing.coordinates = Some(Coordinates::new(52.3 + i as f64 * 0.01, 13.0));
            listing.is_new = i % 7 == 0;
            listing
        })
        .collect();

    let first = ranker.rank(&profile, &listings, &WeightConfig::default()).unwrap();
    let second = ranker.rank(&profile, &listings, &WeightConfig::default()).unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    for pair in first.matches.windows(2) {
        assert!(pair[0].score >= pair[1].score, "Matches not sorted by score");
    }
}

#[test]
fn test_tie_break_order() {
    let ranker = MatchRanker::with_default_constants();

    let mut fresh = create_test_listing("d", 1100.0, "Berlin", true, 55.0);
    fresh.is_new = true;
    let listings = vec![
        create_test_listing("c", 1000.0, "Berlin", true, 55.0),
        create_test_listing("a", 1000.0, "Berlin", true, 55.0),
        fresh,
        create_test_listing("b", 900.0, "Berlin", true, 55.0),
    ];

    let ranking = ranker
        .rank(&create_test_profile(), &listings, &WeightConfig::default())
        .unwrap();

    let ids: Vec<&str> = ranking.matches.iter().map(|m| m.listing_id.as_str()).collect();
    assert_eq!(ids, vec!["d", "b", "a", "c"]);
}

#[test]
fn test_negative_price_is_skipped() {
    let ranker = MatchRanker::with_default_constants();
    let listings = vec![
        create_test_listing("ok", 1000.0, "Berlin", true, 55.0),
        create_test_listing("negative", -200.0, "Berlin", true, 55.0),
    ];

    let ranking = ranker
        .rank(&create_test_profile(), &listings, &WeightConfig::default())
        .unwrap();

    assert_eq!(ranking.matches.len(), 1);
    assert!(ranking.matches.iter().all(|m| m.listing_id != "negative"));
    assert_eq!(ranking.skipped.len(), 1);
    assert_eq!(ranking.skipped[0].listing_id, "negative");
    assert_eq!(ranking.skipped[0].kind, SkipKind::InvalidListing);
    assert_eq!(ranking.total_candidates, 2);
}

#[test]
fn test_custom_weights_change_order() {
    let ranker = MatchRanker::with_default_constants();
    let listings = vec![
        // cheap, wrong city
        create_test_listing("cheap", 900.0, "Hamburg", true, 55.0),
        // right city, over budget
        create_test_listing("central", 1500.0, "Berlin", true, 55.0),
    ];

    let price_heavy = WeightConfig::new(1.0, 10.0, 0.0, 0.0).unwrap();
    let location_heavy = WeightConfig::new(10.0, 1.0, 0.0, 0.0).unwrap();

    let by_price = ranker.rank(&create_test_profile(), &listings, &price_heavy).unwrap();
    let by_location = ranker.rank(&create_test_profile(), &listings, &location_heavy).unwrap();

    assert_eq!(by_price.matches[0].listing_id, "cheap");
    assert_eq!(by_location.matches[0].listing_id, "central");
}

#[test]
fn test_distance_lookups_cached_per_call() {
    let provider = Arc::new(CountingProvider {
        calls: AtomicUsize::new(0),
    });
    let ranker = MatchRanker::with_default_constants().with_distance_provider(provider.clone());

    let mut profile = create_test_profile();
    profile.coordinates = Some(Coordinates::new(52.52, 13.405));

    let listings: Vec<Listing> = (0..6)
        .map(|i| {
            let mut listing = create_test_listing(&format!("l{}", i), 1000.0, "Potsdam", true, 55.0);
            // three distinct locations, each shared by two listings
            listing.coordinates = Some(Coordinates::new(52.40 + (i % 3) as f64 * 0.01, 13.06));
            listing
        })
        .collect();

    ranker.rank(&profile, &listings, &WeightConfig::default()).unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);

    // a second call starts with an empty cache
    ranker.rank(&profile, &listings, &WeightConfig::default()).unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_concurrent_ranking_matches_sequential() {
    let ranker = MatchRanker::with_default_constants()
        .with_distance_provider(Arc::new(HaversineProvider))
        .with_workers(4);
    let mut profile = create_test_profile();
    profile.coordinates = Some(Coordinates::new(52.52, 13.405));

    let listings: Vec<Listing> = (0..100)
        .map(|i| {
            let mut listing = create_test_listing(
                &format!("{:03}", i),
                500.0 + (i as f64 * 17.0) % 1200.0,
                if i % 5 == 0 { "Berlin" } else { "Brandenburg" },
                i % 2 == 0,
                20.0 + (i as f64 * 0.9),
            );
            listing.coordinates = Some(Coordinates::new(52.0 + (i as f64) * 0.01, 13.3));
            listing.is_new = i % 9 == 0;
            listing
        })
        .collect();

    let sequential = ranker.rank(&profile, &listings, &WeightConfig::default()).unwrap();
    let concurrent = ranker
        .rank_concurrent(&profile, listings, WeightConfig::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sequential, concurrent);
    assert!(!concurrent.cancelled);
}

#[tokio::test]
async fn test_concurrent_ranking_rejects_invalid_profile() {
    let ranker = MatchRanker::with_default_constants();
    let mut profile = create_test_profile();
    profile.price_min = Some(5000.0);

    let result = ranker
        .rank_concurrent(&profile, vec![], WeightConfig::default(), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(MatchError::InvalidProfile(_))));
}
