// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   MACD line   = EMA(fast) - EMA(slow)
//   Signal line = EMA(signal_period) of the MACD line
//   Histogram   = MACD line - Signal line
//
// All three EMAs are SMA-seeded (see `ema.rs`), so the first complete MACD
// value lands at close index `slow + signal_period - 2`. The dashboard uses
// the conventional (12, 26, 9) parameterisation.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::ema::calculate_ema;

/// One point of the MACD series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MacdValue {
    pub macd_line: f64,
    pub signal_line: f64,
    pub histogram: f64,
}

/// Compute the MACD series for `closes`.
///
/// One [`MacdValue`] per close starting at index `slow + signal_period - 2`.
/// Returns an empty vec when:
/// - any period is zero, or `fast >= slow`
/// - there are fewer than `slow + signal_period - 1` closes
/// - an underlying EMA series was cut short by non-finite input
pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Vec<MacdValue> {
    if fast == 0 || signal_period == 0 || fast >= slow {
        return Vec::new();
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    // A truncated EMA series means non-finite input somewhere; bail out
    // rather than mis-align the two series.
    if ema_fast.len() != closes.len().saturating_sub(fast - 1)
        || ema_slow.len() != closes.len().saturating_sub(slow - 1)
        || ema_slow.is_empty()
    {
        return Vec::new();
    }

    // The fast series starts `slow - fast` values earlier than the slow one.
    let offset = slow - fast;
    let macd_line: Vec<f64> = ema_slow
        .iter()
        .enumerate()
        .map(|(i, s)| ema_fast[i + offset] - s)
        .collect();

    let signal_line = calculate_ema(&macd_line, signal_period);
    if signal_line.is_empty() {
        return Vec::new();
    }

    let start = macd_line.len() - signal_line.len();
    macd_line[start..]
        .iter()
        .zip(signal_line.iter())
        .map(|(&m, &s)| MacdValue {
            macd_line: m,
            signal_line: s,
            histogram: m - s,
        })
        .collect()
}

/// Most recent MACD value, or `None` when the series is too short.
pub fn latest_macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> Option<MacdValue> {
    calculate_macd(closes, fast, slow, signal_period).pop()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wavy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 42000.0 + (i as f64 * 0.7).sin() * 800.0 + i as f64 * 3.0)
            .collect()
    }

    #[test]
    fn macd_empty_input() {
        assert!(calculate_macd(&[], 12, 26, 9).is_empty());
    }

    #[test]
    fn macd_rejects_degenerate_periods() {
        let closes = wavy(60);
        assert!(calculate_macd(&closes, 0, 26, 9).is_empty());
        assert!(calculate_macd(&closes, 12, 26, 0).is_empty());
        assert!(calculate_macd(&closes, 26, 12, 9).is_empty());
        assert!(calculate_macd(&closes, 12, 12, 9).is_empty());
    }

    #[test]
    fn macd_insufficient_data() {
        // Need slow + signal - 1 = 34 closes for the first value.
        assert!(calculate_macd(&wavy(33), 12, 26, 9).is_empty());
        assert_eq!(calculate_macd(&wavy(34), 12, 26, 9).len(), 1);
    }

    #[test]
    fn macd_histogram_is_line_minus_signal_exactly() {
        let closes = wavy(120);
        let series = calculate_macd(&closes, 12, 26, 9);
        assert!(!series.is_empty());
        for v in &series {
            // Exact identity, not an approximation: the histogram is stored
            // as the literal difference of the two fields.
            assert_eq!(v.histogram, v.macd_line - v.signal_line);
        }
    }

    #[test]
    fn macd_flat_series_is_all_zero() {
        let series = calculate_macd(&[42000.0; 60], 12, 26, 9);
        assert!(!series.is_empty());
        for v in &series {
            assert!(v.macd_line.abs() < 1e-9);
            assert!(v.signal_line.abs() < 1e-9);
            assert!(v.histogram.abs() < 1e-9);
        }
    }

    #[test]
    fn macd_uptrend_goes_positive() {
        // In a steady uptrend the fast EMA sits above the slow EMA.
        let closes: Vec<f64> = (0..80).map(|i| 40000.0 + i as f64 * 100.0).collect();
        let last = calculate_macd(&closes, 12, 26, 9).pop().unwrap();
        assert!(last.macd_line > 0.0);
    }

    #[test]
    fn latest_macd_matches_series_tail() {
        let closes = wavy(90);
        let series = calculate_macd(&closes, 12, 26, 9);
        let last = latest_macd(&closes, 12, 26, 9).unwrap();
        assert_eq!(last.macd_line, series.last().unwrap().macd_line);
    }
}
