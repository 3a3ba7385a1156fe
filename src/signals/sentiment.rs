// =============================================================================
// Macro Sentiment — Fear & Greed bucketing
// =============================================================================
//
// Four fixed bands over the 0–100 index, boundaries inclusive on the lower
// bound of each band:
//
//   >= 75  Extreme Greed
//   >= 50  Greed
//   >= 25  Neutral
//   else   Fear

use serde::{Deserialize, Serialize};

/// Qualitative Fear & Greed band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FearGreedBucket {
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl std::fmt::Display for FearGreedBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fear => write!(f, "Fear"),
            Self::Neutral => write!(f, "Neutral"),
            Self::Greed => write!(f, "Greed"),
            Self::ExtremeGreed => write!(f, "Extreme Greed"),
        }
    }
}

/// Map an index value to its band.
pub fn fear_greed_bucket(index: u32) -> FearGreedBucket {
    if index >= 75 {
        FearGreedBucket::ExtremeGreed
    } else if index >= 50 {
        FearGreedBucket::Greed
    } else if index >= 25 {
        FearGreedBucket::Neutral
    } else {
        FearGreedBucket::Fear
    }
}

/// One-line market commentary for the macro panel. Note the commentary uses
/// its own thresholds (<= 25 for the fear message), separate from the band
/// boundaries above.
pub fn market_commentary(index: u32) -> &'static str {
    if index >= 75 {
        "Market showing signs of extreme greed, potential correction ahead"
    } else if index <= 25 {
        "Market showing signs of extreme fear, potential buying opportunity"
    } else {
        "Market sentiment is neutral"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries_inclusive_on_lower_bound() {
        let cases = [
            (0, FearGreedBucket::Fear),
            (24, FearGreedBucket::Fear),
            (25, FearGreedBucket::Neutral),
            (49, FearGreedBucket::Neutral),
            (50, FearGreedBucket::Greed),
            (74, FearGreedBucket::Greed),
            (75, FearGreedBucket::ExtremeGreed),
            (100, FearGreedBucket::ExtremeGreed),
        ];
        for (index, expected) in cases {
            assert_eq!(fear_greed_bucket(index), expected, "index {index}");
        }
    }

    #[test]
    fn bucket_display_labels() {
        assert_eq!(fear_greed_bucket(80).to_string(), "Extreme Greed");
        assert_eq!(fear_greed_bucket(10).to_string(), "Fear");
    }

    #[test]
    fn commentary_thresholds() {
        assert!(market_commentary(75).contains("extreme greed"));
        assert!(market_commentary(25).contains("extreme fear"));
        assert!(market_commentary(26).contains("neutral"));
        assert!(market_commentary(74).contains("neutral"));
    }
}
