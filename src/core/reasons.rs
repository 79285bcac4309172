use crate::models::{CategoryBreakdown, Reason};

/// Positive reasons for every evaluated category at or above `threshold`
///
/// The breakdown iterates in category priority order, so the output order is
/// stable. Low scores produce nothing.
pub fn generate_reasons(breakdown: &CategoryBreakdown, threshold: u8) -> Vec<Reason> {
    breakdown
        .iter()
        .filter(|(_, score)| *score >= threshold)
        .map(|(category, _)| Reason::for_category(category))
        .collect()
}
