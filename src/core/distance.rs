use crate::core::error::MatchError;
use crate::models::Coordinates;
use geo::{HaversineDistance, Point};
use moka::sync::Cache;
use std::sync::Arc;

/// Source of distances between two points, in kilometers
///
/// Implementations may block (e.g. call out to a routing API); the ranker
/// only invokes them from blocking-safe contexts. A failure is never fatal:
/// the location scorer falls back to its neutral score.
pub trait DistanceProvider: Send + Sync {
    fn distance_km(&self, a: Coordinates, b: Coordinates) -> Result<f64, MatchError>;
}

/// Great-circle distance between two points in kilometers
#[inline]
pub fn haversine_distance(a: Coordinates, b: Coordinates) -> f64 {
    let from = Point::new(a.longitude, a.latitude);
    let to = Point::new(b.longitude, b.latitude);

    from.haversine_distance(&to) / 1000.0
}

/// Straight-line distance provider; never blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineProvider;

impl DistanceProvider for HaversineProvider {
    fn distance_km(&self, a: Coordinates, b: Coordinates) -> Result<f64, MatchError> {
        if !a.is_valid() || !b.is_valid() {
            return Err(MatchError::DistanceUnavailable(
                "coordinates out of range".to_string(),
            ));
        }
        Ok(haversine_distance(a, b))
    }
}

/// Memoizes distance lookups for the duration of one ranking call
///
/// A fresh cache is built per call and dropped with it, so no distance
/// outlives the request that computed it. Failed lookups are cached too.
pub struct DistanceCache {
    inner: Arc<dyn DistanceProvider>,
    entries: Cache<String, Option<f64>>,
}

impl DistanceCache {
    pub fn new(inner: Arc<dyn DistanceProvider>, capacity: u64) -> Self {
        Self {
            inner,
            entries: Cache::new(capacity),
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}

impl DistanceProvider for DistanceCache {
    fn distance_km(&self, a: Coordinates, b: Coordinates) -> Result<f64, MatchError> {
        let key = CacheKey::distance(a, b);
        let cached = self.entries.get_with(key, || match self.inner.distance_km(a, b) {
            Ok(km) => Some(km),
            Err(e) => {
                tracing::debug!("Distance lookup failed: {}", e);
                None
            }
        });

        cached.ok_or_else(|| {
            MatchError::DistanceUnavailable("provider could not resolve distance".to_string())
        })
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a distance lookup between two points
    pub fn distance(a: Coordinates, b: Coordinates) -> String {
        format!(
            "distance:{:.6},{:.6}:{:.6},{:.6}",
            a.latitude, a.longitude, b.latitude, b.longitude
        )
    }
}
