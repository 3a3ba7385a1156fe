pub mod outlook;
pub mod sentiment;

pub use outlook::{build_outlook, map_signals, MacdLabel, Outlook, RsiTone, SignalScores};
pub use sentiment::{fear_greed_bucket, market_commentary, FearGreedBucket};
