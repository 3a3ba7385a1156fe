// =============================================================================
// Central Application State — Helios Dashboard Backend
// =============================================================================
//
// The single source of truth the REST API serves from. The refresh pipeline
// replaces the market / macro / indicator / outlook slots wholesale on every
// tick; nothing is cached across ticks beyond the most recent fetch results.
//
// Thread safety:
//   - AtomicU64 for lock-free version tracking.
//   - parking_lot::RwLock for all mutable shared slots.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::indicators::IndicatorSnapshot;
use crate::llm::OpenAiClient;
use crate::market_data::{MacroFeed, MarketDataFetcher};
use crate::runtime_config::RuntimeConfig;
use crate::signals::{fear_greed_bucket, market_commentary, Outlook};
use crate::types::{MacroFetch, MarketFetch, SeriesOrigin};

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

// =============================================================================
// Records
// =============================================================================

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// One stored LLM prediction, returned verbatim from the provider.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    pub id: String,
    /// ISO 8601 timestamp.
    pub created_at: String,
    /// Length of the prompt that produced this prediction.
    pub prompt_chars: usize,
    pub text: String,
}

// =============================================================================
// AppState
// =============================================================================

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Monotonically increasing version counter, incremented on every
    /// meaningful state mutation.
    pub state_version: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    // ── Collaborator clients ────────────────────────────────────────────
    pub fetcher: MarketDataFetcher,
    pub macro_feed: MacroFeed,
    pub llm: OpenAiClient,

    // ── Latest derivation (replaced wholesale each tick) ────────────────
    pub market: RwLock<Option<MarketFetch>>,
    pub macro_state: RwLock<Option<MacroFetch>>,
    pub indicators: RwLock<Option<IndicatorSnapshot>>,
    pub outlook: RwLock<Option<Outlook>>,
    pub last_refresh: RwLock<Option<String>>,

    // ── Prediction history ──────────────────────────────────────────────
    pub predictions: RwLock<Vec<PredictionRecord>>,

    // ── Error log ───────────────────────────────────────────────────────
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    // ── Timing ──────────────────────────────────────────────────────────
    /// Instant when the backend was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct a new `AppState` from the runtime configuration and the
    /// collaborator clients built in `main`.
    pub fn new(
        config: RuntimeConfig,
        fetcher: MarketDataFetcher,
        macro_feed: MacroFeed,
        llm: OpenAiClient,
    ) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),
            fetcher,
            macro_feed,
            llm,
            market: RwLock::new(None),
            macro_state: RwLock::new(None),
            indicators: RwLock::new(None),
            outlook: RwLock::new(None),
            last_refresh: RwLock::new(None),
            predictions: RwLock::new(Vec::new()),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message. The ring buffer is capped at
    /// [`MAX_RECENT_ERRORS`]; oldest entries are evicted first.
    pub fn push_error(&self, message: String) {
        let record = ErrorRecord {
            message,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }

        self.increment_version();
    }

    // ── Prediction History ──────────────────────────────────────────────

    /// Append a prediction record, trimming to the configured history cap.
    pub fn push_prediction(&self, record: PredictionRecord) {
        let cap = self.runtime_config.read().max_prediction_history;

        let mut predictions = self.predictions.write();
        predictions.push(record);
        while predictions.len() > cap {
            predictions.remove(0);
        }

        self.increment_version();
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Build a complete, serialisable snapshot of the dashboard state.
    ///
    /// This is the payload of `GET /api/v1/state`.
    pub fn build_snapshot(&self) -> DashboardSnapshot {
        let now = Utc::now();
        let version = self.current_state_version();
        let config = self.runtime_config.read();

        let market_guard = self.market.read();
        let market = market_guard.as_ref().map(|m| MarketSummary {
            origin: m.origin,
            samples: m.series.len(),
            first_timestamp_ms: m.series.first().map(|s| s.timestamp_ms),
            last_timestamp_ms: m.series.last().map(|s| s.timestamp_ms),
            last_close: m.series.last().map(|s| s.close),
        });

        let macro_view = self.macro_state.read().as_ref().map(|m| MacroView {
            snapshot: m.snapshot.clone(),
            origin: m.origin,
            bucket: fear_greed_bucket(m.snapshot.fear_greed_index).to_string(),
            commentary: market_commentary(m.snapshot.fear_greed_index).to_string(),
        });

        let truth = TruthHeader {
            state_version: version,
            server_time: now.timestamp_millis(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            last_refresh: self.last_refresh.read().clone(),
            market_origin: market.as_ref().map(|m| m.origin.to_string()),
            macro_origin: macro_view.as_ref().map(|m| m.origin.to_string()),
            poll_interval_secs: config.poll_interval_secs,
        };

        DashboardSnapshot {
            state_version: version,
            server_time: now.timestamp_millis(),
            truth,
            market,
            indicators: self.indicators.read().clone(),
            outlook: self.outlook.read().clone(),
            macro_view,
            predictions: self.predictions.read().clone(),
            recent_errors: Some(self.recent_errors.read().clone()),
        }
    }
}

// =============================================================================
// Serialisable snapshot types
// =============================================================================

/// Full dashboard snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub truth: TruthHeader,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<MarketSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicators: Option<IndicatorSnapshot>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlook: Option<Outlook>,

    #[serde(rename = "macro", skip_serializing_if = "Option::is_none")]
    pub macro_view: Option<MacroView>,

    pub predictions: Vec<PredictionRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_errors: Option<Vec<ErrorRecord>>,
}

/// Operational truth header — the dashboard's primary status banner.
#[derive(Debug, Clone, Serialize)]
pub struct TruthHeader {
    pub state_version: u64,
    pub server_time: i64,
    pub uptime_secs: u64,
    pub last_refresh: Option<String>,
    /// "Live" or "Fallback" for the price series currently on display.
    pub market_origin: Option<String>,
    /// Same, for the macro snapshot.
    pub macro_origin: Option<String>,
    pub poll_interval_secs: u64,
}

/// Compact view of the current price series for the full-state payload.
/// The complete series is served by `GET /api/v1/market`.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSummary {
    pub origin: SeriesOrigin,
    pub samples: usize,
    pub first_timestamp_ms: Option<i64>,
    pub last_timestamp_ms: Option<i64>,
    pub last_close: Option<f64>,
}

/// Macro snapshot plus its derived labels.
#[derive(Debug, Clone, Serialize)]
pub struct MacroView {
    #[serde(flatten)]
    pub snapshot: crate::types::MacroSnapshot,
    pub origin: SeriesOrigin,
    pub bucket: String,
    pub commentary: String,
}
