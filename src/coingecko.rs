// =============================================================================
// CoinGecko REST API Client — historical Bitcoin market data
// =============================================================================
//
// Two public endpoints back the dashboard's price series:
//
//   GET /coins/bitcoin/ohlc          — 5-tuples [ts, open, high, low, close]
//   GET /coins/bitcoin/market_chart  — parallel prices/total_volumes/market_caps
//
// A paid-tier API key, when configured, is sent in the `x-cg-pro-api-key`
// header on every request; without a key the public endpoint applies.
// =============================================================================

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, instrument, warn};

use crate::types::PriceSample;

/// CoinGecko REST client for historical OHLC and market-chart series.
#[derive(Clone)]
pub struct CoinGeckoClient {
    api_key: Option<String>,
    base_url: String,
    vs_currency: String,
    client: reqwest::Client,
}

impl CoinGeckoClient {
    /// Create a new `CoinGeckoClient`.
    ///
    /// # Arguments
    /// * `api_key`     — optional paid-tier key, sent as a header only.
    /// * `vs_currency` — quote currency for all series (canonically `usd`).
    pub fn new(api_key: Option<String>, vs_currency: impl Into<String>) -> Self {
        let api_key = api_key.filter(|k| !k.is_empty());

        let mut default_headers = HeaderMap::new();
        if let Some(key) = &api_key {
            if let Ok(val) = HeaderValue::from_str(key) {
                default_headers.insert("x-cg-pro-api-key", val);
            }
        }

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        debug!(
            keyed = api_key.is_some(),
            "CoinGeckoClient initialised (base_url=https://api.coingecko.com/api/v3)"
        );

        Self {
            api_key,
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            vs_currency: vs_currency.into(),
            client,
        }
    }

    /// Override the base URL (testing against a local stub).
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    // -------------------------------------------------------------------------
    // OHLC endpoint
    // -------------------------------------------------------------------------

    /// GET /coins/bitcoin/ohlc — candles for the last `days` days.
    ///
    /// The response is an array of 5-tuples `[ts, open, high, low, close]`.
    /// Samples are returned sorted ascending by timestamp.
    #[instrument(skip(self), name = "coingecko::get_ohlc")]
    pub async fn get_ohlc(&self, days: u32) -> Result<Vec<PriceSample>> {
        let url = format!(
            "{}/coins/bitcoin/ohlc?vs_currency={}&days={}",
            self.base_url, self.vs_currency, days
        );

        let body = self.get_json(&url, "GET /coins/bitcoin/ohlc").await?;

        let raw = body.as_array().context("ohlc response is not an array")?;

        let mut samples = Vec::with_capacity(raw.len());
        for entry in raw {
            let arr = entry.as_array().context("ohlc entry is not an array")?;
            if arr.len() < 5 {
                warn!("skipping malformed ohlc entry with {} elements", arr.len());
                continue;
            }

            samples.push(PriceSample {
                timestamp_ms: arr[0].as_i64().unwrap_or(0),
                open: Self::parse_f64(&arr[1])?,
                high: Self::parse_f64(&arr[2])?,
                low: Self::parse_f64(&arr[3])?,
                close: Self::parse_f64(&arr[4])?,
                volume: None,
                market_cap: None,
            });
        }

        samples.sort_by_key(|s| s.timestamp_ms);

        debug!(days, count = samples.len(), "ohlc series fetched");
        Ok(samples)
    }

    // -------------------------------------------------------------------------
    // Market-chart endpoint
    // -------------------------------------------------------------------------

    /// GET /coins/bitcoin/market_chart — continuous price series for the last
    /// `days` days, with volume and market cap zipped in by index.
    ///
    /// The scalar price is folded into all four OHLC fields so the two fetch
    /// modes share one sample shape.
    #[instrument(skip(self), name = "coingecko::get_market_chart")]
    pub async fn get_market_chart(&self, days: u32) -> Result<Vec<PriceSample>> {
        let url = format!(
            "{}/coins/bitcoin/market_chart?vs_currency={}&days={}",
            self.base_url, self.vs_currency, days
        );

        let body = self
            .get_json(&url, "GET /coins/bitcoin/market_chart")
            .await?;

        let prices = body["prices"]
            .as_array()
            .context("market_chart response missing 'prices' array")?;
        let volumes = body["total_volumes"].as_array();
        let caps = body["market_caps"].as_array();

        let mut samples = Vec::with_capacity(prices.len());
        for (i, entry) in prices.iter().enumerate() {
            let pair = entry.as_array().context("price entry is not an array")?;
            if pair.len() < 2 {
                warn!("skipping malformed price entry with {} elements", pair.len());
                continue;
            }

            let timestamp_ms = pair[0].as_i64().unwrap_or(0);
            let price = Self::parse_f64(&pair[1])?;

            let volume = volumes
                .and_then(|v| v.get(i))
                .and_then(|e| e.as_array())
                .and_then(|a| a.get(1))
                .and_then(|v| v.as_f64());
            let market_cap = caps
                .and_then(|v| v.get(i))
                .and_then(|e| e.as_array())
                .and_then(|a| a.get(1))
                .and_then(|v| v.as_f64());

            samples.push(PriceSample {
                timestamp_ms,
                open: price,
                high: price,
                low: price,
                close: price,
                volume,
                market_cap,
            });
        }

        samples.sort_by_key(|s| s.timestamp_ms);

        debug!(days, count = samples.len(), "market_chart series fetched");
        Ok(samples)
    }

    // -------------------------------------------------------------------------
    // Global endpoint
    // -------------------------------------------------------------------------

    /// GET /global — only the Bitcoin dominance percentage is consumed.
    #[instrument(skip(self), name = "coingecko::get_btc_dominance")]
    pub async fn get_btc_dominance(&self) -> Result<f64> {
        let url = format!("{}/global", self.base_url);
        let body = self.get_json(&url, "GET /global").await?;

        let dominance = body["data"]["market_cap_percentage"]["btc"]
            .as_f64()
            .context("global response missing data.market_cap_percentage.btc")?;

        debug!(dominance, "btc dominance fetched");
        Ok(dominance)
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    /// Issue a GET, check the status, parse the JSON body.
    async fn get_json(&self, url: &str, what: &'static str) -> Result<serde_json::Value> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("{what} request failed"))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse {what} response"))?;

        if !status.is_success() {
            anyhow::bail!("CoinGecko {what} returned {status}: {body}");
        }

        Ok(body)
    }

    /// Parse a JSON value that may be either a string or a number into `f64`.
    fn parse_f64(val: &serde_json::Value) -> Result<f64> {
        if let Some(n) = val.as_f64() {
            Ok(n)
        } else if let Some(s) = val.as_str() {
            s.parse::<f64>()
                .with_context(|| format!("failed to parse '{s}' as f64"))
        } else {
            anyhow::bail!("expected number or string, got: {val}")
        }
    }
}

impl std::fmt::Debug for CoinGeckoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinGeckoClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("vs_currency", &self.vs_currency)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_f64_accepts_numbers_and_strings() {
        assert_eq!(CoinGeckoClient::parse_f64(&serde_json::json!(42.5)).unwrap(), 42.5);
        assert_eq!(CoinGeckoClient::parse_f64(&serde_json::json!("42.5")).unwrap(), 42.5);
        assert!(CoinGeckoClient::parse_f64(&serde_json::json!(null)).is_err());
        assert!(CoinGeckoClient::parse_f64(&serde_json::json!("not-a-number")).is_err());
    }

    #[test]
    fn empty_api_key_treated_as_absent() {
        let client = CoinGeckoClient::new(Some(String::new()), "usd");
        assert!(client.api_key.is_none());
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = CoinGeckoClient::new(Some("cg-secret".into()), "usd");
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("cg-secret"));
        assert!(rendered.contains("redacted"));
    }
}
