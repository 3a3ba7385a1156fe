// =============================================================================
// OpenAI Chat-Completions Client — prediction pass-through
// =============================================================================
//
// Single on-demand request, no retry, no response parsing beyond extracting
// the completion text. The returned text goes back to the caller verbatim
// (trimmed). A missing credential fails fast with a descriptive error before
// any network I/O; an upstream non-success surfaces the upstream body.
//
// At most one prediction request is in flight at a time: callers must hold a
// [`PredictionPermit`] for the duration of the request.
// =============================================================================

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};

/// Model used for all predictions.
const OPENAI_MODEL: &str = "gpt-4o";

/// Fixed analyst persona for the system role.
const SYSTEM_PROMPT: &str = "You are a financial analyst AI that predicts Bitcoin prices \
based on technical and macroeconomic data.";

const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f64 = 0.7;

/// OpenAI chat-completions client with an at-most-one-in-flight guard.
pub struct OpenAiClient {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
    in_flight: AtomicBool,
}

/// Held while a prediction request is running; released on drop so the guard
/// clears even when the request future is cancelled mid-await.
pub struct PredictionPermit<'a> {
    flag: &'a AtomicBool,
}

impl Drop for PredictionPermit<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl OpenAiClient {
    /// Create a new client. `api_key` is typically read from the
    /// `OPENAI_API_KEY` environment variable; an empty string counts as
    /// absent.
    pub fn new(api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|k| !k.is_empty());

        debug!(keyed = api_key.is_some(), "OpenAiClient initialised");

        Self {
            api_key,
            base_url: "https://api.openai.com".to_string(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("failed to build reqwest client for OpenAiClient"),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Read the credential from `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        Self::new(std::env::var("OPENAI_API_KEY").ok())
    }

    /// Override the base URL (testing against a local stub).
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Whether a credential is configured.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Try to claim the single in-flight slot. Returns `None` while another
    /// prediction is still running.
    pub fn try_begin(&self) -> Option<PredictionPermit<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Some(PredictionPermit {
                flag: &self.in_flight,
            })
        } else {
            warn!("prediction request rejected — another is already in flight");
            None
        }
    }

    /// POST /v1/chat/completions with the constructed prompt and return the
    /// completion text verbatim (trimmed).
    ///
    /// Fails before any network I/O when no credential is configured.
    #[instrument(skip(self, prompt), name = "openai::predict")]
    pub async fn predict(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .context("OPENAI_API_KEY is not configured — predictions are unavailable")?;

        let body = serde_json::json!({
            "model": OPENAI_MODEL,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        });

        let url = format!("{}/v1/chat/completions", self.base_url);

        debug!(prompt_chars = prompt.len(), model = OPENAI_MODEL, "sending prediction request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("POST /v1/chat/completions request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({status}): {error_body}");
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse chat completion response")?;

        let content = body["choices"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|choice| choice["message"]["content"].as_str())
            .context("completion response missing choices[0].message.content")?;

        debug!(chars = content.len(), "prediction received");
        Ok(content.trim().to_string())
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}
