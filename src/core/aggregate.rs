use crate::models::{CategoryBreakdown, WeightConfig};

/// Overall score used when nothing weighted could be evaluated
pub const DEGENERATE_SCORE: u8 = 50;

/// Combined score for one listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregate {
    pub score: u8,
    pub degenerate: bool,
}

/// Weighted average of the evaluated sub-scores
///
/// Normalizes by the weights of the categories present in the breakdown only,
/// so preferences the tenant never expressed don't drag the score down.
///
/// Weights are scaled by the largest one in play before summing, which keeps
/// the sums finite for any finite weights.
pub fn aggregate(breakdown: &CategoryBreakdown, weights: &WeightConfig) -> Aggregate {
    let largest = breakdown
        .iter()
        .map(|(category, _)| weights.weight(category))
        .fold(0.0, f64::max);

    if largest <= 0.0 {
        return Aggregate {
            score: DEGENERATE_SCORE,
            degenerate: true,
        };
    }

    let (weighted, total_weight) = breakdown.iter().fold((0.0, 0.0), |(sum, total), (category, score)| {
        let weight = weights.weight(category) / largest;
        (sum + weight * score as f64, total + weight)
    });

    let score = (weighted / total_weight).round().clamp(0.0, 100.0) as u8;

    Aggregate {
        score,
        degenerate: false,
    }
}
