// =============================================================================
// Heuristic Outlook — directional scores and qualitative labels
// =============================================================================
//
// Maps one indicator snapshot to bounded heuristic signal scores and display
// labels. Pure functions, no I/O, total over well-formed snapshots. The
// scores are unitless percentage-point deltas, not calibrated forecasts:
//
//   base  = 0
//         + 2  if RSI < 30   (oversold, bullish tilt)
//         - 2  if RSI > 70   (overbought, bearish tilt)
//         + 1  if MACD line > signal line, else - 1
//
//   short = base,  mid = 2·base,  long = 3·base
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::{fit_price_trend, IndicatorSnapshot, MacdValue, TrendLine};
use crate::types::PriceSample;

/// Directional score per horizon, in percentage points.
///
/// Fixed relation: `mid_term == 2 * short_term`, `long_term == 3 * short_term`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalScores {
    pub short_term: f64,
    pub mid_term: f64,
    pub long_term: f64,
}

/// Qualitative MACD crossover label.
///
/// `Neutral` is only produced when either MACD field is exactly zero — the
/// cold-start default. Real numeric data always lands on Bullish/Bearish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdLabel {
    Bullish,
    Bearish,
    Neutral,
}

impl std::fmt::Display for MacdLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Bearish => write!(f, "Bearish"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

/// RSI display tone. Colouring only — not part of the numeric contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiTone {
    Overbought,
    Oversold,
    Neutral,
}

impl std::fmt::Display for RsiTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "Overbought"),
            Self::Oversold => write!(f, "Oversold"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Full derived outlook for the dashboard's prediction panel.
#[derive(Debug, Clone, Serialize)]
pub struct Outlook {
    pub scores: SignalScores,
    pub macd_label: MacdLabel,
    pub rsi_tone: RsiTone,
    /// OLS trend over (index, close) — prediction-heuristic context only.
    pub trend: TrendLine,
    /// Trend line evaluated one step past the end of the series.
    pub projected_next_close: f64,
}

/// Map an indicator snapshot to the three horizon scores.
pub fn map_signals(snapshot: &IndicatorSnapshot) -> SignalScores {
    let mut base = 0.0;

    if snapshot.rsi < 30.0 {
        base += 2.0;
    } else if snapshot.rsi > 70.0 {
        base -= 2.0;
    }

    if snapshot.macd.macd_line > snapshot.macd.signal_line {
        base += 1.0;
    } else {
        base -= 1.0;
    }

    SignalScores {
        short_term: base,
        mid_term: base * 2.0,
        long_term: base * 3.0,
    }
}

/// Crossover label for the MACD panel.
pub fn macd_label(macd: &MacdValue) -> MacdLabel {
    // Zero fields mean the cold-start default snapshot, not a real crossover.
    if macd.macd_line == 0.0 || macd.signal_line == 0.0 {
        return MacdLabel::Neutral;
    }
    if macd.macd_line > macd.signal_line {
        MacdLabel::Bullish
    } else {
        MacdLabel::Bearish
    }
}

/// Display tone for the RSI readout.
pub fn rsi_tone(rsi: f64) -> RsiTone {
    if rsi > 70.0 {
        RsiTone::Overbought
    } else if rsi < 30.0 {
        RsiTone::Oversold
    } else {
        RsiTone::Neutral
    }
}

/// Assemble the full outlook from a snapshot and the series it came from.
pub fn build_outlook(snapshot: &IndicatorSnapshot, series: &[PriceSample]) -> Outlook {
    let trend = fit_price_trend(series);
    let projected_next_close = trend.project(series.len() as f64);

    Outlook {
        scores: map_signals(snapshot),
        macd_label: macd_label(&snapshot.macd),
        rsi_tone: rsi_tone(snapshot.rsi),
        trend,
        projected_next_close,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::BollingerValue;

    fn snapshot(rsi: f64, macd_line: f64, signal_line: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi,
            macd: MacdValue {
                macd_line,
                signal_line,
                histogram: macd_line - signal_line,
            },
            bollinger: BollingerValue::default(),
        }
    }

    #[test]
    fn oversold_with_bullish_cross_scores_plus_three() {
        let scores = map_signals(&snapshot(25.0, 10.0, 5.0));
        assert_eq!(scores.short_term, 3.0);
        assert_eq!(scores.mid_term, 6.0);
        assert_eq!(scores.long_term, 9.0);
    }

    #[test]
    fn overbought_with_bearish_cross_scores_minus_three() {
        let scores = map_signals(&snapshot(80.0, -10.0, -5.0));
        assert_eq!(scores.short_term, -3.0);
        assert_eq!(scores.mid_term, -6.0);
        assert_eq!(scores.long_term, -9.0);
    }

    #[test]
    fn neutral_rsi_leaves_only_macd_contribution() {
        assert_eq!(map_signals(&snapshot(50.0, 2.0, 1.0)).short_term, 1.0);
        assert_eq!(map_signals(&snapshot(50.0, 1.0, 2.0)).short_term, -1.0);
    }

    #[test]
    fn rsi_thresholds_are_exclusive() {
        // Exactly 30 / 70 sit inside the neutral band.
        assert_eq!(map_signals(&snapshot(30.0, 2.0, 1.0)).short_term, 1.0);
        assert_eq!(map_signals(&snapshot(70.0, 2.0, 1.0)).short_term, 1.0);
    }

    #[test]
    fn horizon_multiples_hold_for_every_snapshot() {
        for rsi in [0.0, 25.0, 30.0, 50.0, 70.0, 75.0, 100.0] {
            for (m, s) in [(1.0, 2.0), (2.0, 1.0), (-3.0, -1.0)] {
                let scores = map_signals(&snapshot(rsi, m, s));
                assert_eq!(scores.mid_term, 2.0 * scores.short_term);
                assert_eq!(scores.long_term, 3.0 * scores.short_term);
            }
        }
    }

    #[test]
    fn macd_label_bullish_and_bearish() {
        assert_eq!(macd_label(&snapshot(50.0, 5.0, 2.0).macd), MacdLabel::Bullish);
        assert_eq!(macd_label(&snapshot(50.0, 2.0, 5.0).macd), MacdLabel::Bearish);
    }

    #[test]
    fn macd_label_neutral_only_on_zero_fields() {
        // Documents the observed asymmetry: Neutral needs a literal zero
        // field (the cold-start default); any non-zero pair maps to
        // Bullish/Bearish, even when the two are nearly equal.
        assert_eq!(macd_label(&MacdValue::default()), MacdLabel::Neutral);
        assert_eq!(
            macd_label(&snapshot(50.0, 0.0, 3.0).macd),
            MacdLabel::Neutral
        );
        assert_eq!(
            macd_label(&snapshot(50.0, 1e-12, 2e-12).macd),
            MacdLabel::Bearish
        );
    }

    #[test]
    fn rsi_tone_bands() {
        assert_eq!(rsi_tone(75.0), RsiTone::Overbought);
        assert_eq!(rsi_tone(25.0), RsiTone::Oversold);
        assert_eq!(rsi_tone(50.0), RsiTone::Neutral);
        assert_eq!(rsi_tone(70.0), RsiTone::Neutral);
        assert_eq!(rsi_tone(30.0), RsiTone::Neutral);
    }

    #[test]
    fn build_outlook_projects_one_step_ahead() {
        // Perfectly linear closes: projection continues the line.
        let series: Vec<PriceSample> = (0..10)
            .map(|i| PriceSample {
                timestamp_ms: i as i64,
                open: 0.0,
                high: 0.0,
                low: 0.0,
                close: 100.0 + 10.0 * i as f64,
                volume: None,
                market_cap: None,
            })
            .collect();
        let outlook = build_outlook(&snapshot(50.0, 1.0, 2.0), &series);
        assert!((outlook.projected_next_close - 200.0).abs() < 1e-6);
        assert!((outlook.trend.slope - 10.0).abs() < 1e-6);
    }
}
