pub mod fetcher;
pub mod macro_feed;

// Re-export the two fetch entry points used by the refresh pipeline.
pub use fetcher::MarketDataFetcher;
pub use macro_feed::MacroFeed;
