// =============================================================================
// Macro Feed — Fear & Greed Index + Bitcoin market dominance
// =============================================================================
//
// Two independent sources, fetched concurrently and combined into one
// [`MacroSnapshot`]:
//
//   GET https://api.alternative.me/fng/   — data[0].value, 0..100
//   GET CoinGecko /global                 — data.market_cap_percentage.btc
//
// Like the price-series fetch, this boundary never propagates failures: if
// either source fails the whole snapshot falls back to fixed constants,
// tagged [`SeriesOrigin::Fallback`].

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::coingecko::CoinGeckoClient;
use crate::types::{MacroFetch, MacroSnapshot, SeriesOrigin};

/// Constant snapshot substituted when either macro source fails.
const FALLBACK_FEAR_GREED: u32 = 50;
const FALLBACK_DOMINANCE: f64 = 45.5;

/// Fetches the macro sentiment snapshot with a constant fallback.
#[derive(Debug, Clone)]
pub struct MacroFeed {
    client: reqwest::Client,
    fear_greed_url: String,
    coingecko: CoinGeckoClient,
}

impl MacroFeed {
    pub fn new(coingecko: CoinGeckoClient) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("failed to build reqwest client for MacroFeed"),
            fear_greed_url: "https://api.alternative.me/fng/".to_string(),
            coingecko,
        }
    }

    /// Override the Fear & Greed URL (testing against a local stub).
    #[cfg(test)]
    pub fn with_fear_greed_url(mut self, url: impl Into<String>) -> Self {
        self.fear_greed_url = url.into();
        self
    }

    /// Fetch both macro sources concurrently. Any failure on either side
    /// yields the constant fallback snapshot; the two are not mixed.
    pub async fn fetch_macro_snapshot(&self) -> MacroFetch {
        let (fear_greed, dominance) =
            tokio::join!(self.fetch_fear_greed(), self.coingecko.get_btc_dominance());

        match (fear_greed, dominance) {
            (Ok(fear_greed_index), Ok(market_dominance)) => {
                debug!(fear_greed_index, market_dominance, "macro snapshot fetched");
                MacroFetch {
                    snapshot: MacroSnapshot {
                        fear_greed_index,
                        market_dominance,
                    },
                    origin: SeriesOrigin::Live,
                }
            }
            (fg, dom) => {
                if let Err(e) = fg {
                    warn!(error = %e, "fear & greed fetch failed");
                }
                if let Err(e) = dom {
                    warn!(error = %e, "market dominance fetch failed");
                }
                warn!("macro fetch failed — substituting constant snapshot");
                MacroFetch {
                    snapshot: MacroSnapshot {
                        fear_greed_index: FALLBACK_FEAR_GREED,
                        market_dominance: FALLBACK_DOMINANCE,
                    },
                    origin: SeriesOrigin::Fallback,
                }
            }
        }
    }

    /// GET the current Fear & Greed Index value.
    async fn fetch_fear_greed(&self) -> Result<u32> {
        let resp = self
            .client
            .get(&self.fear_greed_url)
            .send()
            .await
            .context("GET fear & greed index request failed")?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse fear & greed response")?;

        if !status.is_success() {
            anyhow::bail!("fear & greed API returned {status}: {body}");
        }

        parse_fear_greed(&body)
    }
}

/// Extract `data[0].value` from an alternative.me response body. The value
/// arrives as a string.
fn parse_fear_greed(body: &serde_json::Value) -> Result<u32> {
    let value = body["data"]
        .as_array()
        .and_then(|arr| arr.first())
        .context("fear & greed response missing data[0]")?;

    let index: u32 = value["value"]
        .as_str()
        .context("fear & greed data[0].value is not a string")?
        .parse()
        .context("fear & greed data[0].value is not an integer")?;

    Ok(index)
}
