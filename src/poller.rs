// =============================================================================
// Refresh Poller — explicit scheduler owning the periodic fetch+derive task
// =============================================================================
//
// One configurable pipeline backs every consumer: the periodic tick, the
// on-demand `POST /api/v1/refresh`, and startup priming all run the same
// [`refresh_tick`]. The poller exposes an explicit start/stop lifecycle and
// owns a single cancellable task.
//
// Overlap policy: ticks run sequentially inside one task, and missed ticks
// are skipped (`MissedTickBehavior::Skip`), so a slow fetch can never stack
// refreshes behind itself.
// =============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::indicators::compute_indicators;
use crate::signals::build_outlook;
use crate::types::SeriesOrigin;

/// Run one fetch-then-derive cycle and store the results.
///
/// The market and macro fetches are independent and run concurrently; both
/// complete (success or fallback) before anything is derived. All derived
/// values are recomputed from scratch and the state slots replaced wholesale.
pub async fn refresh_tick(state: &Arc<AppState>) {
    let (days, mode) = {
        let config = state.runtime_config.read();
        (config.days, config.fetch_mode)
    };

    let (market, macro_fetch) = tokio::join!(
        state.fetcher.fetch_price_series(days, mode),
        state.macro_feed.fetch_macro_snapshot(),
    );

    // Fallback substitutions are absorbed at the fetch boundary but still
    // reported through the error log so outages stay visible.
    if market.origin == SeriesOrigin::Fallback {
        state.push_error("market data provider unavailable — serving synthetic series".into());
    }
    if macro_fetch.origin == SeriesOrigin::Fallback {
        state.push_error("macro providers unavailable — serving constant snapshot".into());
    }

    let indicators = compute_indicators(&market.series);
    let outlook = indicators
        .as_ref()
        .map(|snap| build_outlook(snap, &market.series));

    if indicators.is_none() {
        warn!("empty price series — indicators unavailable this tick");
    }

    info!(
        samples = market.series.len(),
        market_origin = %market.origin,
        macro_origin = %macro_fetch.origin,
        fear_greed = macro_fetch.snapshot.fear_greed_index,
        "refresh tick complete"
    );

    *state.market.write() = Some(market);
    *state.macro_state.write() = Some(macro_fetch);
    *state.indicators.write() = indicators;
    *state.outlook.write() = outlook;
    *state.last_refresh.write() = Some(chrono::Utc::now().to_rfc3339());
    state.increment_version();
}

/// Owns the periodic refresh task. Start/stop are explicit; dropping the
/// poller does not silently keep the task alive.
pub struct Poller {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    pub fn new() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    /// Spawn the periodic task. The first tick fires immediately, priming the
    /// state before the API serves its first request. Calling `start` while
    /// already running is a no-op.
    pub fn start(&self, state: Arc<AppState>, interval: std::time::Duration) {
        let mut guard = self.handle.lock();
        if guard.is_some() {
            warn!("poller already running — start ignored");
            return;
        }

        info!(interval_secs = interval.as_secs(), "poller starting");

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                refresh_tick(&state).await;
            }
        });

        *guard = Some(handle);
    }

    /// Cancel the periodic task. Safe to call when not running.
    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
            info!("poller stopped");
        }
    }

    /// Whether the periodic task is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.handle.lock().is_some()
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coingecko::CoinGeckoClient;
    use crate::llm::OpenAiClient;
    use crate::market_data::{MacroFeed, MarketDataFetcher};
    use crate::runtime_config::RuntimeConfig;

    fn offline_state() -> Arc<AppState> {
        // Unroutable providers: every fetch falls back, which is exactly what
        // the pipeline must absorb.
        let coingecko =
            CoinGeckoClient::new(None, "usd").with_base_url("http://127.0.0.1:9/api/v3");
        Arc::new(AppState::new(
            RuntimeConfig::default(),
            MarketDataFetcher::new(coingecko.clone()),
            MacroFeed::new(coingecko).with_fear_greed_url("http://127.0.0.1:9/fng/"),
            OpenAiClient::new(None),
        ))
    }

    #[tokio::test]
    async fn refresh_tick_populates_all_slots_from_fallback() {
        let state = offline_state();
        refresh_tick(&state).await;

        let market = state.market.read();
        let market = market.as_ref().unwrap();
        assert_eq!(market.origin, SeriesOrigin::Fallback);
        assert_eq!(market.series.len(), 31);

        assert!(state.indicators.read().is_some());
        assert!(state.outlook.read().is_some());
        assert!(state.last_refresh.read().is_some());

        let macro_state = state.macro_state.read();
        assert_eq!(macro_state.as_ref().unwrap().origin, SeriesOrigin::Fallback);
    }

    #[tokio::test]
    async fn refresh_tick_records_fallback_in_error_log() {
        let state = offline_state();
        refresh_tick(&state).await;

        let errors = state.recent_errors.read();
        assert!(errors.iter().any(|e| e.message.contains("market data provider")));
        assert!(errors.iter().any(|e| e.message.contains("macro providers")));
    }

    #[tokio::test]
    async fn refresh_tick_bumps_version() {
        let state = offline_state();
        let before = state.current_state_version();
        refresh_tick(&state).await;
        assert!(state.current_state_version() > before);
    }

    #[tokio::test]
    async fn poller_lifecycle_start_stop() {
        let state = offline_state();
        let poller = Poller::new();
        assert!(!poller.is_running());

        poller.start(state.clone(), std::time::Duration::from_secs(3600));
        assert!(poller.is_running());

        // Second start is a no-op, not a second task.
        poller.start(state, std::time::Duration::from_secs(3600));
        assert!(poller.is_running());

        poller.stop();
        assert!(!poller.is_running());

        // Stopping again is safe.
        poller.stop();
    }
}
