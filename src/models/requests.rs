use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::models::domain::{Listing, SearchProfile, SkipKind, SkipRecord, WeightConfig};

/// Request to rank a batch of listings
///
/// Listings stay raw JSON until [`parse_listings`] so a single malformed
/// record can't reject the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RankRequest {
    pub profile: SearchProfile,
    pub listings: Vec<Value>,
    /// Falls back to the configured weights when absent
    #[serde(default)]
    pub weights: Option<WeightConfig>,
    #[serde(default)]
    #[validate(length(min = 2, max = 16))]
    pub locale: Option<String>,
}

/// Request to explain how one listing scores
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRequest {
    pub profile: SearchProfile,
    pub listing: Listing,
    #[serde(default)]
    pub weights: Option<WeightConfig>,
    #[serde(default)]
    #[validate(length(min = 2, max = 16))]
    pub locale: Option<String>,
}

/// Decode raw listings, turning the ones that don't decode into skip records
///
/// A record without a usable id is reported by its position, e.g. `#3`.
pub fn parse_listings(raw: Vec<Value>) -> (Vec<Listing>, Vec<SkipRecord>) {
    let mut listings = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();

    for (index, value) in raw.into_iter().enumerate() {
        let listing_id = match value.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => format!("#{}", index),
        };

        match serde_json::from_value::<Listing>(value) {
            Ok(listing) => listings.push(listing),
            Err(e) => {
                tracing::debug!("Rejecting malformed listing {}: {}", listing_id, e);
                rejected.push(SkipRecord {
                    listing_id,
                    kind: SkipKind::InvalidListing,
                    detail: e.to_string(),
                });
            }
        }
    }

    (listings, rejected)
}
