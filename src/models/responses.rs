use serde::{Deserialize, Serialize};

use crate::models::domain::{CategoryBreakdown, MatchResult, Ranking, SkipRecord};
use crate::models::locale::Locale;

/// A match as shown to clients, with reasons rendered for one locale
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub listing_id: String,
    pub score: u8,
    pub breakdown: CategoryBreakdown,
    pub reasons: Vec<String>,
    pub degenerate: bool,
}

impl MatchView {
    pub fn render(result: MatchResult, locale: Locale) -> Self {
        Self {
            reasons: locale.render_all(&result.reasons),
            listing_id: result.listing_id,
            score: result.score,
            breakdown: result.breakdown,
            degenerate: result.degenerate,
        }
    }
}

/// Response for the rank endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResponse {
    pub request_id: String,
    pub matches: Vec<MatchView>,
    pub skipped: Vec<SkipRecord>,
    pub total_candidates: usize,
    pub cancelled: bool,
}

impl RankResponse {
    pub fn render(request_id: String, ranking: Ranking, locale: Locale) -> Self {
        Self {
            request_id,
            matches: ranking
                .matches
                .into_iter()
                .map(|m| MatchView::render(m, locale))
                .collect(),
            skipped: ranking.skipped,
            total_candidates: ranking.total_candidates,
            cancelled: ranking.cancelled,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
