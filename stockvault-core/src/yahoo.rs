//! Yahoo Finance data provider.
//!
//! Fetches daily and 1-minute OHLCV bars from Yahoo's v8 chart API over
//! blocking HTTP. Yahoo has no official API and is subject to unannounced
//! format changes; shape surprises surface as `FetchError::ResponseFormat`.
//!
//! Daily prices are returned split/dividend adjusted: open/high/low are
//! scaled by `adjclose / close` and close is replaced by `adjclose`, which
//! is what the chart API's adjusted-close track encodes.

use crate::provider::{FetchError, MarketDataProvider};
use crate::series::{Bar, IntradayBar};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// One parsed row, shared between the daily and intraday paths.
#[derive(Debug)]
struct RawRow {
    ts: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

/// Yahoo Finance provider over blocking HTTP.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("failed to build HTTP client");

        Self { client }
    }

    /// Chart URL for a daily range. A missing start means "full history",
    /// expressed with `range=max`; otherwise both bounds are inclusive
    /// (start at 00:00:00, end at 23:59:59).
    fn daily_url(ticker: &str, start: Option<NaiveDate>, end: NaiveDate) -> String {
        let base = format!("https://query2.finance.yahoo.com/v8/finance/chart/{ticker}");
        match start {
            Some(start) => {
                let period1 = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
                let period2 = end.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp();
                format!(
                    "{base}?period1={period1}&period2={period2}&interval=1d\
                     &includeAdjustedClose=true"
                )
            }
            None => format!("{base}?range=max&interval=1d&includeAdjustedClose=true"),
        }
    }

    fn intraday_url(ticker: &str, lookback: &str) -> String {
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{ticker}\
             ?range={lookback}&interval=1m&includePrePost=true"
        )
    }

    /// Execute one GET and decode the chart envelope.
    fn get_chart(&self, ticker: &str, url: &str) -> Result<ChartResponse, FetchError> {
        let resp = self.client.get(url).send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                FetchError::Network(e.to_string())
            } else {
                FetchError::Provider(e.to_string())
            }
        })?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Provider(format!("HTTP {status} for {ticker}")));
        }

        resp.json().map_err(|e| {
            FetchError::ResponseFormat(format!("failed to parse response for {ticker}: {e}"))
        })
    }

    /// Unwrap the chart envelope into per-row values plus the adjusted-close
    /// track. Rows where every OHLCV field is null (holidays, halted
    /// sessions) are skipped. An empty result is legitimate — a fetch window
    /// past the last trading day returns no rows.
    fn parse_rows(
        ticker: &str,
        resp: ChartResponse,
    ) -> Result<(Vec<RawRow>, Vec<Option<f64>>), FetchError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    FetchError::SymbolNotFound {
                        ticker: ticker.to_string(),
                    }
                } else {
                    FetchError::Provider(format!("{}: {}", err.code, err.description))
                }
            } else {
                FetchError::ResponseFormat("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::ResponseFormat("result array is empty".into()))?;

        // No timestamps at all means an empty range, not a malformed reply.
        let timestamps = match data.timestamp {
            Some(ts) => ts,
            None => return Ok((Vec::new(), Vec::new())),
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::ResponseFormat("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose)
            .unwrap_or_default();

        let mut rows = Vec::with_capacity(timestamps.len());
        let mut adj = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            rows.push(RawRow {
                ts,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
            });
            adj.push(adj_closes.get(i).copied().flatten());
        }

        Ok((rows, adj))
    }

    /// Scale a row onto its adjusted-close track. Without an adjusted close
    /// (intraday responses omit the track) prices pass through raw.
    fn adjust(row: &RawRow, adj_close: Option<f64>) -> (f64, f64, f64, f64) {
        match adj_close {
            Some(adj) if row.close != 0.0 && row.close.is_finite() => {
                let factor = adj / row.close;
                (
                    row.open * factor,
                    row.high * factor,
                    row.low * factor,
                    adj,
                )
            }
            _ => (row.open, row.high, row.low, row.close),
        }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataProvider for YahooProvider {
    fn fetch_daily(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, FetchError> {
        let url = Self::daily_url(ticker, start, end);
        let resp = self.get_chart(ticker, &url)?;
        let (rows, adj) = Self::parse_rows(ticker, resp)?;

        let mut bars = Vec::with_capacity(rows.len());
        for (row, adj_close) in rows.iter().zip(adj) {
            let date = chrono::DateTime::from_timestamp(row.ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    FetchError::ResponseFormat(format!("invalid timestamp: {}", row.ts))
                })?;

            let (open, high, low, close) = Self::adjust(row, adj_close);
            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume: row.volume,
            });
        }

        Ok(bars)
    }

    fn fetch_intraday(
        &self,
        ticker: &str,
        lookback: &str,
    ) -> Result<Vec<IntradayBar>, FetchError> {
        let url = Self::intraday_url(ticker, lookback);
        let resp = self.get_chart(ticker, &url)?;
        let (rows, _) = Self::parse_rows(ticker, resp)?;

        let mut bars = Vec::with_capacity(rows.len());
        for row in rows {
            let timestamp = chrono::DateTime::from_timestamp(row.ts, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| {
                    FetchError::ResponseFormat(format!("invalid timestamp: {}", row.ts))
                })?;

            bars.push(IntradayBar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        Ok(bars)
    }
}
