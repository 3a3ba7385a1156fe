// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator math plus the snapshot derivation the
// refresh pipeline runs over each fetched price series. Everything is
// recomputed from scratch on every refresh; nothing is incremental.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod regression;
pub mod rsi;

use serde::{Deserialize, Serialize};

use crate::types::PriceSample;
pub use bollinger::{calculate_bollinger, BollingerValue};
pub use macd::{calculate_macd, MacdValue};
pub use regression::{fit_price_trend, linear_regression, TrendLine};
pub use rsi::calculate_rsi;

/// RSI look-back window.
pub const RSI_PERIOD: usize = 14;
/// MACD fast EMA period.
pub const MACD_FAST: usize = 12;
/// MACD slow EMA period.
pub const MACD_SLOW: usize = 26;
/// MACD signal EMA period.
pub const MACD_SIGNAL: usize = 9;
/// Bollinger SMA window.
pub const BOLLINGER_PERIOD: usize = 20;
/// Bollinger band width in standard deviations.
pub const BOLLINGER_STD: f64 = 2.0;

/// The most recent value of each indicator series, derived from one
/// price series. Ephemeral: rebuilt wholesale on every refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd: MacdValue,
    pub bollinger: BollingerValue,
}

/// Derive an [`IndicatorSnapshot`] from a price series.
///
/// An empty series is "insufficient data", reported as `None` rather than an
/// error. A non-empty series that is still too short for a given indicator
/// reports that indicator's zero default, matching what the dashboard has
/// always displayed for a cold start.
pub fn compute_indicators(series: &[PriceSample]) -> Option<IndicatorSnapshot> {
    if series.is_empty() {
        return None;
    }

    let closes: Vec<f64> = series.iter().map(|s| s.close).collect();

    let rsi = rsi::latest_rsi(&closes, RSI_PERIOD).unwrap_or(0.0);
    let macd = macd::latest_macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL).unwrap_or_default();
    let bollinger =
        calculate_bollinger(&closes, BOLLINGER_PERIOD, BOLLINGER_STD).unwrap_or_default();

    Some(IndicatorSnapshot { rsi, macd, bollinger })
}
