use crate::core::{
    aggregate::aggregate,
    distance::{DistanceCache, DistanceProvider},
    error::MatchError,
    profile::{normalize_profile, NormalizedProfile},
    reasons::generate_reasons,
    scoring::score_categories,
};
use crate::models::{
    Listing, MatchResult, Ranking, ScoringConstants, SearchProfile, SkipKind, SkipRecord,
    WeightConfig,
};
use futures::stream::{self, StreamExt};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const MIN_WORKERS: usize = 2;
const MAX_WORKERS: usize = 32;
const DEFAULT_DISTANCE_CACHE_SIZE: u64 = 10_000;

/// A scored listing together with the keys used to break score ties
#[derive(Debug, Clone)]
struct Scored {
    result: MatchResult,
    is_new: bool,
    price: Option<f64>,
    index: usize,
}

/// Scores listings against a tenant profile and ranks them
///
/// # Pipeline
/// 1. Profile normalization (once per call)
/// 2. Listing validation (invalid listings become skip records)
/// 3. Category scoring
/// 4. Weighted aggregation and reason generation
/// 5. A single deterministic sort
///
/// Weights are supplied per call; the ranker itself only carries the
/// scoring constants, the optional distance provider and the pool size.
#[derive(Clone)]
pub struct MatchRanker {
    constants: ScoringConstants,
    distance: Option<Arc<dyn DistanceProvider>>,
    workers: usize,
    distance_cache_size: u64,
}

impl fmt::Debug for MatchRanker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchRanker")
            .field("constants", &self.constants)
            .field("has_distance_provider", &self.distance.is_some())
            .field("workers", &self.workers)
            .field("distance_cache_size", &self.distance_cache_size)
            .finish()
    }
}

impl MatchRanker {
    pub fn new(constants: ScoringConstants) -> Self {
        Self {
            constants,
            distance: None,
            workers: default_workers(),
            distance_cache_size: DEFAULT_DISTANCE_CACHE_SIZE,
        }
    }

    pub fn with_default_constants() -> Self {
        Self::new(ScoringConstants::default())
    }

    pub fn with_distance_provider(mut self, provider: Arc<dyn DistanceProvider>) -> Self {
        self.distance = Some(provider);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_distance_cache_size(mut self, size: u64) -> Self {
        self.distance_cache_size = size.max(1);
        self
    }

    pub fn constants(&self) -> &ScoringConstants {
        &self.constants
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Score a single listing, e.g. to render its breakdown
    ///
    /// Fails with `InvalidProfile` or `InvalidListing`; no state is shared
    /// with [`MatchRanker::rank`].
    pub fn explain(
        &self,
        profile: &SearchProfile,
        listing: &Listing,
        weights: &WeightConfig,
    ) -> Result<MatchResult, MatchError> {
        let normalized = normalize_profile(profile)?;
        let distance = self.call_distance();
        let scored = score_listing(&normalized, listing, weights, distance.as_deref(), &self.constants, 0)
            .map_err(|skip| MatchError::InvalidListing {
                id: skip.listing_id,
                reason: skip.detail,
            })?;

        Ok(scored.result)
    }

    /// Rank a batch of listings sequentially
    ///
    /// Only an invalid profile fails the call; invalid listings are left out
    /// of `matches` and reported in `skipped`.
    pub fn rank(
        &self,
        profile: &SearchProfile,
        listings: &[Listing],
        weights: &WeightConfig,
    ) -> Result<Ranking, MatchError> {
        let normalized = normalize_profile(profile)?;
        let distance = self.call_distance();

        let mut scored = Vec::with_capacity(listings.len());
        let mut skipped = Vec::new();

        for (index, listing) in listings.iter().enumerate() {
            match score_listing(&normalized, listing, weights, distance.as_deref(), &self.constants, index) {
                Ok(s) => scored.push(s),
                Err(skip) => skipped.push(skip),
            }
        }

        Ok(finish(scored, skipped, listings.len(), false))
    }

    /// Rank a batch of listings on a bounded pool of blocking workers
    ///
    /// Each listing is scored on tokio's blocking pool since the distance
    /// provider may block. At most `workers` listings are in flight. The
    /// token is checked before each listing starts; once cancelled, the
    /// listings already scored are returned with `cancelled` set.
    pub async fn rank_concurrent(
        &self,
        profile: &SearchProfile,
        listings: Vec<Listing>,
        weights: WeightConfig,
        cancel: &CancellationToken,
    ) -> Result<Ranking, MatchError> {
        let normalized = Arc::new(normalize_profile(profile)?);
        let distance = self.call_distance();
        let constants = self.constants;
        let total_candidates = listings.len();

        let outcomes: Vec<Result<Scored, SkipRecord>> = stream::iter(listings.into_iter().enumerate())
            .map(|(index, listing)| {
                let profile = Arc::clone(&normalized);
                let distance = distance.clone();
                let cancel = cancel.clone();

                async move {
                    if cancel.is_cancelled() {
                        return None;
                    }

                    let listing_id = listing.id.clone();
                    let task = tokio::task::spawn_blocking(move || {
                        score_listing(&profile, &listing, &weights, distance.as_deref(), &constants, index)
                    });

                    match task.await {
                        Ok(outcome) => Some(outcome),
                        Err(e) => {
                            tracing::error!("Scoring task for listing {} failed: {}", listing_id, e);
                            Some(Err(SkipRecord {
                                listing_id,
                                kind: SkipKind::ScoringFailed,
                                detail: e.to_string(),
                            }))
                        }
                    }
                }
            })
            .buffer_unordered(self.workers)
            .filter_map(|outcome| async move { outcome })
            .collect()
            .await;

        let processed = outcomes.len();
        let cancelled = processed < total_candidates;
        if cancelled {
            tracing::warn!(
                "Ranking cancelled after {} of {} listings",
                processed,
                total_candidates
            );
        }

        let mut scored = Vec::with_capacity(processed);
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(s) => scored.push(s),
                Err(skip) => skipped.push(skip),
            }
        }

        Ok(finish(scored, skipped, total_candidates, cancelled))
    }

    /// Distance provider for one call, memoized for that call only
    fn call_distance(&self) -> Option<Arc<dyn DistanceProvider>> {
        self.distance.as_ref().map(|inner| {
            let cache = DistanceCache::new(Arc::clone(inner), self.distance_cache_size);
            Arc::new(cache) as Arc<dyn DistanceProvider>
        })
    }
}

impl Default for MatchRanker {
    fn default() -> Self {
        Self::with_default_constants()
    }
}

/// Worker pool size for the available compute, clamped to a sane range
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(MIN_WORKERS, MAX_WORKERS)
}

fn score_listing(
    profile: &NormalizedProfile,
    listing: &Listing,
    weights: &WeightConfig,
    distance: Option<&dyn DistanceProvider>,
    constants: &ScoringConstants,
    index: usize,
) -> Result<Scored, SkipRecord> {
    if let Err(e) = listing.validate() {
        tracing::debug!("Skipping listing {:?}: {}", listing.id, e);
        let detail = match e {
            MatchError::InvalidListing { reason, .. } => reason,
            other => other.to_string(),
        };
        return Err(SkipRecord {
            listing_id: listing.id.clone(),
            kind: SkipKind::InvalidListing,
            detail,
        });
    }

    let breakdown = score_categories(profile, listing, distance, constants);
    let total = aggregate(&breakdown, weights);
    let reasons = generate_reasons(&breakdown, constants.reason_threshold);

    Ok(Scored {
        result: MatchResult {
            listing_id: listing.id.clone(),
            score: total.score,
            breakdown,
            reasons,
            degenerate: total.degenerate,
        },
        is_new: listing.is_new,
        price: listing.price,
        index,
    })
}

fn finish(
    mut scored: Vec<Scored>,
    mut skipped: Vec<SkipRecord>,
    total_candidates: usize,
    cancelled: bool,
) -> Ranking {
    scored.sort_by(compare_ranked);
    skipped.sort();

    Ranking {
        matches: scored.into_iter().map(|s| s.result).collect(),
        skipped,
        total_candidates,
        cancelled,
    }
}

/// Score descending, then new listings first, then cheaper first, then id
///
/// Input position is the last resort so duplicate ids still order the same
/// way whichever worker finished first.
fn compare_ranked(a: &Scored, b: &Scored) -> Ordering {
    b.result
        .score
        .cmp(&a.result.score)
        .then_with(|| b.is_new.cmp(&a.is_new))
        .then_with(|| compare_price(a.price, b.price))
        .then_with(|| a.result.listing_id.cmp(&b.result.listing_id))
        .then_with(|| a.index.cmp(&b.index))
}

/// Ascending, with listings of unknown price after priced ones
fn compare_price(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
