use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::Reason;

/// Language used to render reason text at the service boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    De,
}

impl Locale {
    pub fn render(&self, reason: Reason) -> &'static str {
        match (self, reason) {
            (Locale::En, Reason::PreferredLocation) => "Matches your preferred location",
            (Locale::En, Reason::WithinBudget) => "Within your budget",
            (Locale::En, Reason::AmenitiesMatch) => "Has the amenities you asked for",
            (Locale::En, Reason::SizeFits) => "Size fits your needs",
            (Locale::De, Reason::PreferredLocation) => "Entspricht Ihrer bevorzugten Lage",
            (Locale::De, Reason::WithinBudget) => "Innerhalb Ihres Budgets",
            (Locale::De, Reason::AmenitiesMatch) => "Bietet die gewünschte Ausstattung",
            (Locale::De, Reason::SizeFits) => "Größe passt zu Ihren Wünschen",
        }
    }

    pub fn render_all(&self, reasons: &[Reason]) -> Vec<String> {
        reasons.iter().map(|r| self.render(*r).to_string()).collect()
    }
}

impl FromStr for Locale {
    type Err = String;

    /// Accepts bare language codes and region-qualified tags (`de-AT`, `en_GB`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let language = s
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        match language.as_str() {
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            _ => Err(format!("unsupported locale: {}", s)),
        }
    }
}
