use actix_web::{web, HttpResponse, Responder};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::config::MatchingSettings;
use crate::core::{MatchError, MatchRanker};
use crate::models::{
    parse_listings, ErrorResponse, ExplainRequest, HealthResponse, Locale, MatchView, RankRequest,
    RankResponse, WeightConfig,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub ranker: MatchRanker,
    /// Used when a request carries no weights of its own
    pub weights: WeightConfig,
    pub matching: MatchingSettings,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/rank", web::post().to(rank_listings))
        .route("/matches/explain", web::post().to(explain_listing));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Rank listings endpoint
///
/// POST /api/v1/matches/rank
///
/// Request body:
/// ```json
/// {
///   "profile": { "city": "Berlin", "priceMin": 800, "priceMax": 1200, "desiredRooms": 2 },
///   "listings": [{ "id": "l1", "price": 1000, "rooms": 2, "size": 55, "city": "Berlin" }],
///   "weights": { "location": 30, "price": 35, "amenities": 15, "size": 20 },
///   "locale": "en"
/// }
/// ```
async fn rank_listings(
    state: web::Data<AppState>,
    req: web::Json<RankRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for rank request: field_errors={:?}", errors);
        return bad_request("Validation failed", errors.to_string());
    }

    let req = req.into_inner();
    let max_batch = state.matching.max_batch_size();
    if req.listings.len() > max_batch {
        return bad_request(
            "Batch too large",
            format!("at most {} listings per request, got {}", max_batch, req.listings.len()),
        );
    }

    let locale = match resolve_locale(req.locale.as_deref(), state.matching.default_locale) {
        Ok(locale) => locale,
        Err(message) => return bad_request("Invalid locale", message),
    };

    let request_id = uuid::Uuid::new_v4().to_string();
    let weights = req.weights.unwrap_or(state.weights);
    let (listings, rejected) = parse_listings(req.listings);

    tracing::info!(
        "Ranking {} listings for request {} ({} malformed, locale: {:?})",
        listings.len(),
        request_id,
        rejected.len(),
        locale
    );

    let cancel = CancellationToken::new();
    let timer = {
        let cancel = cancel.clone();
        let timeout = Duration::from_millis(state.matching.timeout_ms());
        actix_web::rt::spawn(async move {
            tokio::time::sleep(timeout).await;
            cancel.cancel();
        })
    };

    let result = state
        .ranker
        .rank_concurrent(&req.profile, listings, weights, &cancel)
        .await;
    timer.abort();

    match result {
        Ok(ranking) => {
            let ranking = ranking.with_rejected(rejected);
            tracing::info!(
                "Returning {} matches for request {} ({} skipped, cancelled: {})",
                ranking.matches.len(),
                request_id,
                ranking.skipped.len(),
                ranking.cancelled
            );
            HttpResponse::Ok().json(RankResponse::render(request_id, ranking, locale))
        }
        Err(e) => {
            tracing::info!("Rejected rank request {}: {}", request_id, e);
            match_error_response(&e)
        }
    }
}

/// Explain a single listing endpoint
///
/// POST /api/v1/matches/explain
///
/// Request body:
/// ```json
/// {
///   "profile": { "city": "Berlin", "desiredAmenities": { "petsAllowed": true } },
///   "listing": { "id": "l1", "city": "Berlin", "amenities": { "petsAllowed": true } },
///   "locale": "de"
/// }
/// ```
async fn explain_listing(
    state: web::Data<AppState>,
    req: web::Json<ExplainRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let locale = match resolve_locale(req.locale.as_deref(), state.matching.default_locale) {
        Ok(locale) => locale,
        Err(message) => return bad_request("Invalid locale", message),
    };

    let weights = req.weights.unwrap_or(state.weights);
    let ranker = state.ranker.clone();
    let req = req.into_inner();
    let listing_id = req.listing.id.clone();

    // the distance provider may block
    let outcome = web::block(move || ranker.explain(&req.profile, &req.listing, &weights)).await;

    match outcome {
        Ok(Ok(result)) => {
            tracing::debug!("Explained listing {}: score {}", result.listing_id, result.score);
            HttpResponse::Ok().json(MatchView::render(result, locale))
        }
        Ok(Err(e)) => {
            tracing::info!("Rejected explain request for listing {:?}: {}", listing_id, e);
            match_error_response(&e)
        }
        Err(e) => {
            tracing::error!("Explain task for listing {:?} failed: {}", listing_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Scoring failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

fn resolve_locale(requested: Option<&str>, default: Locale) -> Result<Locale, String> {
    match requested {
        Some(tag) => tag.parse(),
        None => Ok(default),
    }
}

fn bad_request(error: &str, message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    })
}

fn match_error_response(err: &MatchError) -> HttpResponse {
    let (error, status_code) = match err {
        MatchError::InvalidProfile(_) => ("Invalid profile", 400),
        MatchError::InvalidWeights(_) => ("Invalid weights", 400),
        MatchError::InvalidListing { .. } => ("Invalid listing", 422),
        MatchError::DistanceUnavailable(_) => ("Distance unavailable", 503),
    };

    let body = ErrorResponse {
        error: error.to_string(),
        message: err.to_string(),
        status_code,
    };

    match status_code {
        400 => HttpResponse::BadRequest().json(body),
        422 => HttpResponse::UnprocessableEntity().json(body),
        _ => HttpResponse::ServiceUnavailable().json(body),
    }
}
