// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. The API is the presentation boundary
// of the dashboard: read endpoints serve the latest derived state, the two
// POST endpoints trigger a refresh tick and the LLM prediction flow.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

use crate::app_state::{AppState, PredictionRecord};
use crate::llm::build_prediction_prompt;
use crate::poller;
use crate::signals::{fear_greed_bucket, market_commentary};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/market", get(market))
        .route("/api/v1/indicators", get(indicators))
        .route("/api/v1/macro", get(macro_panel))
        .route("/api/v1/outlook", get(outlook))
        .route("/api/v1/refresh", post(refresh))
        .route("/api/v1/predict", post(predict))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "state_version": state.current_state_version(),
        "server_time": chrono::Utc::now().timestamp_millis(),
    }))
}

// =============================================================================
// Full state snapshot
// =============================================================================

async fn full_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

// =============================================================================
// Market series
// =============================================================================

async fn market(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.market.read().clone() {
        Some(fetch) => Json(fetch).into_response(),
        None => no_data("No price data available yet"),
    }
}

// =============================================================================
// Indicators
// =============================================================================

async fn indicators(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.indicators.read().clone() {
        Some(snapshot) => Json(snapshot).into_response(),
        // Empty series upstream: a "no data" display state, not an error.
        None => no_data("No indicator data available yet"),
    }
}

// =============================================================================
// Macro panel
// =============================================================================

async fn macro_panel(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.macro_state.read().clone() {
        Some(fetch) => {
            let body = serde_json::json!({
                "fear_greed_index": fetch.snapshot.fear_greed_index,
                "market_dominance": fetch.snapshot.market_dominance,
                "origin": fetch.origin,
                "bucket": fear_greed_bucket(fetch.snapshot.fear_greed_index).to_string(),
                "commentary": market_commentary(fetch.snapshot.fear_greed_index),
            });
            Json(body).into_response()
        }
        None => no_data("No macro data available yet"),
    }
}

// =============================================================================
// Outlook
// =============================================================================

async fn outlook(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.outlook.read().clone() {
        Some(outlook) => Json(outlook).into_response(),
        None => no_data("No outlook available yet"),
    }
}

// =============================================================================
// Refresh (on demand)
// =============================================================================

async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    poller::refresh_tick(&state).await;
    Json(serde_json::json!({
        "status": "refreshed",
        "state_version": state.current_state_version(),
    }))
}

// =============================================================================
// Prediction (on demand, at most one in flight)
// =============================================================================

async fn predict(State(state): State<Arc<AppState>>) -> axum::response::Response {
    // Reject a second trigger while one request is running; the permit is
    // released on drop even if this handler is cancelled mid-await.
    let Some(_permit) = state.llm.try_begin() else {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "error": "a prediction is already in flight" })),
        )
            .into_response();
    };

    let (days, mode) = {
        let config = state.runtime_config.read();
        (config.days, config.fetch_mode)
    };

    // Fresh context for the prompt, independent of the polling cadence.
    let (market, macro_fetch) = tokio::join!(
        state.fetcher.fetch_price_series(days, mode),
        state.macro_feed.fetch_macro_snapshot(),
    );

    let prompt = build_prediction_prompt(&market.series, &macro_fetch.snapshot);

    match state.llm.predict(&prompt).await {
        Ok(text) => {
            let record = PredictionRecord {
                id: Uuid::new_v4().to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
                prompt_chars: prompt.len(),
                text,
            };
            state.push_prediction(record.clone());
            info!(id = %record.id, "prediction stored");
            Json(record).into_response()
        }
        Err(e) => {
            // Missing credential is a local configuration fault; anything
            // else at this point came back from the upstream call.
            let status = if state.llm.has_credential() {
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            state.push_error(format!("prediction failed: {e:#}"));
            (
                status,
                Json(serde_json::json!({ "error": format!("{e:#}") })),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn no_data(message: &str) -> axum::response::Response {
    Json(serde_json::json!({ "data": null, "message": message })).into_response()
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::coingecko::CoinGeckoClient;
    use crate::llm::OpenAiClient;
    use crate::market_data::{MacroFeed, MarketDataFetcher};
    use crate::runtime_config::RuntimeConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn offline_state() -> Arc<AppState> {
        let coingecko =
            CoinGeckoClient::new(None, "usd").with_base_url("http://127.0.0.1:9/api/v3");
        Arc::new(AppState::new(
            RuntimeConfig::default(),
            MarketDataFetcher::new(coingecko.clone()),
            MacroFeed::new(coingecko).with_fear_greed_url("http://127.0.0.1:9/fng/"),
            OpenAiClient::new(None),
        ))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = router(offline_state());
        let response = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn indicators_before_first_tick_is_no_data() {
        let app = router(offline_state());
        let response = app
            .oneshot(
                Request::get("/api/v1/indicators")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["data"].is_null());
        assert!(json["message"].as_str().unwrap().contains("No indicator"));
    }

    #[tokio::test]
    async fn refresh_then_indicators_serves_snapshot() {
        let state = offline_state();
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/v1/refresh")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::get("/api/v1/indicators")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        // The offline fetch falls back to a 31-sample synthetic series, which
        // is enough for RSI and Bollinger but not MACD(12,26,9).
        assert!(json["rsi"].is_number());
        assert!(json["bollinger"]["middle"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn predict_without_credential_is_500_with_message() {
        let app = router(offline_state());
        let response = app
            .oneshot(
                Request::post("/api/v1/predict")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("OPENAI_API_KEY"));
    }
}
