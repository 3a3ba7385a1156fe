// =============================================================================
// Prediction Prompt Builder
// =============================================================================
//
// Pure function, independent of the HTTP call, so the template is
// unit-testable without network access. The prompt carries the last 30 daily
// OHLC samples plus the macro snapshot and asks for three price calls.

use crate::types::{MacroSnapshot, PriceSample};

/// How many trailing samples go into the prompt.
const PROMPT_WINDOW: usize = 30;

/// Build the natural-language prediction prompt from the price series and the
/// macro snapshot.
pub fn build_prediction_prompt(series: &[PriceSample], macro_snapshot: &MacroSnapshot) -> String {
    let window = &series[series.len().saturating_sub(PROMPT_WINDOW)..];

    let price_summary = window
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "Day {}: O:{} H:{} L:{} C:{}",
                i + 1,
                s.open,
                s.high,
                s.low,
                s.close
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Given the following Bitcoin technical and macroeconomic data, predict the exact price \
         for the next day, next 2 weeks, and next month.\n\n\
         Recent daily OHLC data (last 30 days):\n{price_summary}\n\n\
         Macroeconomic indicators:\n\
         - Fear & Greed Index: {fear_greed}\n\
         - Market Dominance: {dominance}%\n\n\
         Please provide your reasoning and the predicted prices in USD for:\n\
         - Next day\n\
         - Next 2 weeks\n\
         - Next month",
        fear_greed = macro_snapshot.fear_greed_index,
        dominance = macro_snapshot.market_dominance,
    )
}
