//! Stockvault Core — a small local warehouse for equity price series.
//!
//! Downloads daily adjusted OHLCV bars from Yahoo Finance, persists one CSV
//! per (symbol, market), and on later runs fetches only the missing date
//! range, merging it in with last-write-wins dedupe by date. A pass-through
//! intraday call returns recent 1-minute bars without persisting them.
//!
//! Everything is synchronous and single-threaded; concurrent writers to the
//! same store root are not defended against.

pub mod market;
pub mod provider;
pub mod series;
pub mod store;
pub mod warehouse;
pub mod yahoo;

pub use market::{Ident, Market};
pub use provider::{FetchError, MarketDataProvider};
pub use series::{Bar, IntradayBar, Series};
pub use store::{CsvStore, StoreError};
pub use warehouse::{BatchSummary, StdoutProgress, UpdateOutcome, UpdateProgress, Warehouse};
pub use yahoo::YahooProvider;
