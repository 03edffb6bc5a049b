//! Market-data provider trait and structured fetch errors.
//!
//! The trait abstracts the upstream data source so the warehouse can be
//! exercised against a scripted mock in tests. The cache layer sits above
//! this trait; providers know nothing about the store.

use crate::series::{Bar, IntradayBar};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors a provider fetch can surface.
///
/// The warehouse catches all of these at its boundary and degrades to a
/// "no data" outcome; they never cross an update call as a hard failure.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited by provider")]
    RateLimited,

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("symbol not found: {ticker}")]
    SymbolNotFound { ticker: String },

    #[error("provider error: {0}")]
    Provider(String),
}

/// Blocking market-data source.
///
/// Both date bounds of `fetch_daily` are inclusive. `start = None` requests
/// the provider's full available history. An empty `Vec` is a routine
/// outcome (nothing traded in the range), not an error.
pub trait MarketDataProvider {
    /// Daily adjusted OHLCV bars for `ticker` over `[start, end]`.
    fn fetch_daily(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, FetchError>;

    /// Recent 1-minute bars over a provider lookback token (e.g. "1d"),
    /// including pre-market and after-hours sessions.
    fn fetch_intraday(&self, ticker: &str, lookback: &str)
        -> Result<Vec<IntradayBar>, FetchError>;
}
