// =============================================================================
// Helios BTC — Main Entry Point
// =============================================================================
//
// Long-running dashboard backend: a periodic refresh pipeline keeps the
// shared state current while the REST API serves it. The poller owns the
// only recurring task and is stopped explicitly on shutdown.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod coingecko;
mod indicators;
mod llm;
mod market_data;
mod poller;
mod runtime_config;
mod signals;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::coingecko::CoinGeckoClient;
use crate::llm::OpenAiClient;
use crate::market_data::{MacroFeed, MarketDataFetcher};
use crate::poller::Poller;
use crate::runtime_config::RuntimeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Helios BTC Dashboard — Starting Up               ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load("runtime_config.json").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Override bind address from env if available.
    if let Ok(addr) = std::env::var("HELIOS_BIND_ADDR") {
        if !addr.is_empty() {
            config.bind_addr = addr;
        }
    }

    info!(
        days = config.days,
        fetch_mode = %config.fetch_mode,
        poll_interval_secs = config.poll_interval_secs,
        "Configured refresh pipeline"
    );

    // ── 2. Build collaborator clients ────────────────────────────────────
    let coingecko_key = std::env::var("COINGECKO_API_KEY").ok();
    let coingecko = CoinGeckoClient::new(coingecko_key, config.vs_currency.clone());

    let fetcher = MarketDataFetcher::new(coingecko.clone());
    let macro_feed = MacroFeed::new(coingecko);
    let llm = OpenAiClient::from_env();

    if !llm.has_credential() {
        warn!("OPENAI_API_KEY not set — the prediction endpoint will fail fast until it is");
    }

    // ── 3. Build shared state ────────────────────────────────────────────
    let poll_interval = std::time::Duration::from_secs(config.poll_interval_secs);
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, fetcher, macro_feed, llm));

    // ── 4. Start the refresh poller ──────────────────────────────────────
    let poller = Poller::new();
    poller.start(state.clone(), poll_interval);

    // ── 5. Start the API server ──────────────────────────────────────────
    let api_state = state.clone();
    let bind_addr_clone = bind_addr.clone();

    tokio::spawn(async move {
        let app = api::rest::router(api_state);
        let listener = tokio::net::TcpListener::bind(&bind_addr_clone)
            .await
            .expect("Failed to bind API server");
        info!(addr = %bind_addr_clone, "API server listening");
        axum::serve(listener, app)
            .await
            .expect("API server failed");
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    poller.stop();

    if let Err(e) = state.runtime_config.read().save("runtime_config.json") {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Helios BTC Dashboard shut down complete.");
    Ok(())
}
