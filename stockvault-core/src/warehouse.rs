//! Warehouse orchestration — incremental updates, local reads, batch runs.
//!
//! The warehouse sits between the provider seam and the CSV store. Provider
//! failures are caught here and degrade to a "no data" outcome for that
//! identifier; filesystem failures propagate. "Today" is an explicit
//! parameter so the fetch upper bound is testable with an injected clock.

use crate::market::Ident;
use crate::provider::{FetchError, MarketDataProvider};
use crate::series::{IntradayBar, Series};
use crate::store::{CsvStore, StoreError};
use chrono::{Duration, NaiveDate};

/// Outcome of one incremental update. Fetch failures are an outcome, not an
/// error: only the store can fail an update hard.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The file was rewritten. `fetched` counts the records the provider
    /// returned, before date dedupe.
    Updated { fetched: usize },
    /// Provider returned nothing for the requested range; file untouched.
    NoNewData,
    /// Provider call failed; file untouched.
    FetchFailed(FetchError),
}

/// Per-identifier reporting for batch runs.
pub trait UpdateProgress {
    fn on_outcome(&self, ident: &Ident, outcome: &Result<UpdateOutcome, StoreError>);
}

/// Prints the classic per-symbol status lines to stdout.
pub struct StdoutProgress;

impl UpdateProgress for StdoutProgress {
    fn on_outcome(&self, ident: &Ident, outcome: &Result<UpdateOutcome, StoreError>) {
        match outcome {
            Ok(UpdateOutcome::Updated { fetched }) => {
                println!("updated {} with {fetched} new records", ident.symbol);
            }
            Ok(UpdateOutcome::NoNewData) => {
                println!("no new data for {}", ident.symbol);
            }
            Ok(UpdateOutcome::FetchFailed(err)) => {
                println!("error downloading {}: {err}", ident.symbol);
            }
            Err(err) => {
                println!("store failure for {}: {err}", ident.symbol);
            }
        }
    }
}

/// Tally of a batch run. Fetch failures and store errors are counted
/// separately: the former are routine skips, the latter are the fatal class
/// a caller should surface in its exit status.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub updated: usize,
    pub no_data: usize,
    pub fetch_failed: usize,
    pub store_errors: usize,
}

/// The data warehouse: one provider, one store root.
pub struct Warehouse<'a> {
    provider: &'a dyn MarketDataProvider,
    store: CsvStore,
}

impl<'a> Warehouse<'a> {
    pub fn new(provider: &'a dyn MarketDataProvider, store: CsvStore) -> Self {
        Self { provider, store }
    }

    pub fn store(&self) -> &CsvStore {
        &self.store
    }

    /// Extend the stored series for `ident` up to `today`.
    ///
    /// With an existing file the fetch starts the calendar day after the
    /// last stored date; without one the full history is requested. On a
    /// date collision the fetched bar replaces the stored one — the provider
    /// may have revised the most recent stored day.
    ///
    /// A start date already past `today` just produces an empty fetch and
    /// falls out as `NoNewData`; no special-casing.
    pub fn update_historical(
        &self,
        ident: &Ident,
        today: NaiveDate,
    ) -> Result<UpdateOutcome, StoreError> {
        let existing = self.store.load(ident)?;
        let start = existing
            .as_ref()
            .and_then(Series::last_date)
            .map(|last| last + Duration::days(1));

        let ticker = ident.provider_ticker();
        let fetched = match self.provider.fetch_daily(&ticker, start, today) {
            Ok(bars) => bars,
            Err(err) => {
                tracing::warn!(ident = %ident, error = %err, "historical fetch failed");
                return Ok(UpdateOutcome::FetchFailed(err));
            }
        };

        if fetched.is_empty() {
            return Ok(UpdateOutcome::NoNewData);
        }

        let fetched_count = fetched.len();
        let mut series = existing.unwrap_or_default();
        series.merge(fetched);
        self.store.save(ident, &series)?;

        Ok(UpdateOutcome::Updated {
            fetched: fetched_count,
        })
    }

    /// Read the stored series back, or `None` when nothing is stored yet.
    pub fn local_series(&self, ident: &Ident) -> Result<Option<Series>, StoreError> {
        self.store.load(ident)
    }

    /// Recent 1-minute bars straight from the provider; never persisted.
    /// Failures are logged and collapse to `None`.
    pub fn intraday(&self, ident: &Ident, lookback: &str) -> Option<Vec<IntradayBar>> {
        let ticker = ident.provider_ticker();
        match self.provider.fetch_intraday(&ticker, lookback) {
            Ok(bars) => Some(bars),
            Err(err) => {
                tracing::warn!(ident = %ident, error = %err, "intraday fetch failed");
                None
            }
        }
    }

    /// Update each identifier in input order. One identifier's failure —
    /// provider or store — never stops the rest.
    pub fn batch_update(
        &self,
        idents: &[Ident],
        today: NaiveDate,
        progress: &dyn UpdateProgress,
    ) -> BatchSummary {
        let mut summary = BatchSummary {
            total: idents.len(),
            ..Default::default()
        };

        for ident in idents {
            let outcome = self.update_historical(ident, today);
            progress.on_outcome(ident, &outcome);
            match &outcome {
                Ok(UpdateOutcome::Updated { .. }) => summary.updated += 1,
                Ok(UpdateOutcome::NoNewData) => summary.no_data += 1,
                Ok(UpdateOutcome::FetchFailed(_)) => summary.fetch_failed += 1,
                Err(_) => summary.store_errors += 1,
            }
        }

        summary
    }
}
