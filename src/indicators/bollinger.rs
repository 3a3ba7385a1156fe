// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Moving-average envelope over the trailing window:
//
//   middle = SMA(period)
//   upper  = middle + num_std * σ
//   lower  = middle - num_std * σ
//
// σ is the population standard deviation of the same window. The dashboard
// uses (20, 2.0). A constant-price window collapses all three bands onto the
// SMA.

use serde::{Deserialize, Serialize};

/// The three band values for the most recent window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BollingerValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Calculate Bollinger Bands over the trailing `period` closes.
///
/// Returns `None` when:
/// - `period == 0` or fewer than `period` closes are available
/// - the computed bands are non-finite (degenerate input)
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> Option<BollingerValue> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;

    let variance = window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();

    let upper = middle + num_std * std_dev;
    let lower = middle - num_std * std_dev;

    if upper.is_finite() && lower.is_finite() {
        Some(BollingerValue { upper, middle, lower })
    } else {
        None
    }
}
