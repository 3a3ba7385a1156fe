// =============================================================================
// Shared types used across the Helios dashboard backend
// =============================================================================

use serde::{Deserialize, Serialize};

/// One sample of the Bitcoin price series.
///
/// The canonical shape is OHLC (the CoinGecko `/ohlc` endpoint). The
/// continuous-price market-chart mode folds its single scalar price into all
/// four OHLC fields and carries the parallel volume / market-cap arrays.
/// Indicators consume `close` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSample {
    /// Epoch milliseconds.
    pub timestamp_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,

    /// Trade volume, when the source provides it (market-chart mode and the
    /// synthetic fallback; the OHLC endpoint does not).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,

    /// Total market capitalisation, same availability as `volume`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
}

/// Coarse macro sentiment readout, fetched independently of the price series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroSnapshot {
    /// Fear & Greed Index, 0 (fear) to 100 (greed).
    pub fear_greed_index: u32,
    /// Bitcoin share of total crypto market capitalisation, in percent.
    pub market_dominance: f64,
}

/// Provenance tag on fetched data: real provider data or the deterministic
/// on-failure substitute. Callers and tests can tell the two apart instead of
/// always receiving the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesOrigin {
    Live,
    Fallback,
}

impl std::fmt::Display for SeriesOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "Live"),
            Self::Fallback => write!(f, "Fallback"),
        }
    }
}

/// Result of a price-series fetch: the series plus where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct MarketFetch {
    pub series: Vec<PriceSample>,
    pub origin: SeriesOrigin,
}

/// Result of a macro fetch: the snapshot plus where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct MacroFetch {
    pub snapshot: MacroSnapshot,
    pub origin: SeriesOrigin,
}

/// Which CoinGecko endpoint backs the price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchMode {
    /// `/coins/bitcoin/ohlc` — 5-tuples `[ts, open, high, low, close]`.
    Ohlc,
    /// `/coins/bitcoin/market_chart` — parallel price/volume/market-cap arrays.
    MarketChart,
}

impl Default for FetchMode {
    fn default() -> Self {
        Self::Ohlc
    }
}

impl std::fmt::Display for FetchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ohlc => write!(f, "OHLC"),
            Self::MarketChart => write!(f, "MarketChart"),
        }
    }
}
