//! OHLCV bars and the date-keyed series they form.
//!
//! `Series` owns the merge algorithm at the heart of incremental updates:
//! concatenate stored + freshly fetched bars, sort by date (stable), and keep
//! the last occurrence per date so a revised bar from the provider overwrites
//! what was stored.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar. Prices are provider-adjusted for splits/dividends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// One minute-granularity bar. Transient; never written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradayBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Date-ordered series of daily bars for one identifier.
///
/// Invariants: dates are unique and strictly ascending. Both are restored by
/// every constructor and by `merge`, so holding a `Series` means holding a
/// normalized one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    /// Build a series from bars in any order, keeping the last bar per date.
    pub fn from_bars(bars: Vec<Bar>) -> Self {
        Self {
            bars: normalize(bars),
        }
    }

    /// Merge freshly fetched bars into this series.
    ///
    /// New bars are appended after the stored ones before normalizing, so on
    /// a date collision the fetched bar wins. This matters for the most
    /// recent stored date, which the provider may have revised.
    pub fn merge(&mut self, fetched: Vec<Bar>) {
        let mut combined = std::mem::take(&mut self.bars);
        combined.extend(fetched);
        self.bars = normalize(combined);
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Date of the most recent stored bar, if any.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}

/// Stable sort by date, then keep the last occurrence for each date.
///
/// The stable sort preserves concatenation order within equal dates, so "last
/// occurrence" means the bar from the most recently appended source.
fn normalize(mut bars: Vec<Bar>) -> Vec<Bar> {
    bars.sort_by_key(|b| b.date);

    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(prev) if prev.date == bar.date => *prev = bar,
            _ => out.push(bar),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use proptest::prelude::*;

    fn bar(y: i32, m: u32, d: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn from_bars_sorts_ascending() {
        let s = Series::from_bars(vec![bar(2024, 1, 3, 3.0), bar(2024, 1, 2, 2.0)]);
        assert_eq!(s.bars()[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(s.last_date(), NaiveDate::from_ymd_opt(2024, 1, 3));
    }

    #[test]
    fn merge_overlapping_date_takes_fetched_bar() {
        // Stored D1..D5, fetched D4..D7 with a revised D4 close.
        let mut stored = Series::from_bars(
            (1..=5).map(|d| bar(2024, 1, d, d as f64)).collect(),
        );
        let fetched: Vec<Bar> = (4..=7)
            .map(|d| bar(2024, 1, d, d as f64 + 100.0))
            .collect();

        stored.merge(fetched);

        assert_eq!(stored.len(), 7);
        let dates: Vec<u32> = stored.bars().iter().map(|b| b.date.day()).collect();
        assert_eq!(dates, vec![1, 2, 3, 4, 5, 6, 7]);
        // D4 and D5 carry the fetched values, D1..D3 the stored ones.
        assert_eq!(stored.bars()[3].close, 104.0);
        assert_eq!(stored.bars()[4].close, 105.0);
        assert_eq!(stored.bars()[2].close, 3.0);
    }

    #[test]
    fn merge_empty_fetch_is_a_noop() {
        let mut s = Series::from_bars(vec![bar(2024, 1, 2, 2.0), bar(2024, 1, 3, 3.0)]);
        let before = s.clone();
        s.merge(Vec::new());
        assert_eq!(s, before);
    }

    #[test]
    fn merge_into_empty_series_is_the_fetch() {
        let mut s = Series::default();
        s.merge(vec![bar(2024, 1, 3, 3.0), bar(2024, 1, 2, 2.0)]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.bars()[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    // ── Property tests ───────────────────────────────────────────────

    fn arb_bar() -> impl Strategy<Value = Bar> {
        (0u32..400, 1.0..500.0f64, 0u64..1_000_000).prop_map(|(day, close, volume)| Bar {
            date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(day as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        })
    }

    proptest! {
        /// Dates are strictly increasing after any merge.
        #[test]
        fn merged_dates_strictly_increase(
            stored in proptest::collection::vec(arb_bar(), 0..50),
            fetched in proptest::collection::vec(arb_bar(), 0..50),
        ) {
            let mut s = Series::from_bars(stored);
            s.merge(fetched);
            for pair in s.bars().windows(2) {
                prop_assert!(pair[0].date < pair[1].date);
            }
        }

        /// Merging the same fetch twice changes nothing the second time.
        #[test]
        fn merge_is_idempotent(
            stored in proptest::collection::vec(arb_bar(), 0..50),
            fetched in proptest::collection::vec(arb_bar(), 0..50),
        ) {
            let mut once = Series::from_bars(stored);
            once.merge(fetched.clone());
            let mut twice = once.clone();
            twice.merge(fetched);
            prop_assert_eq!(once, twice);
        }

        /// Every fetched date ends up carrying the fetched bar.
        #[test]
        fn fetched_bar_wins_on_collision(
            stored in proptest::collection::vec(arb_bar(), 0..50),
            fetched in proptest::collection::vec(arb_bar(), 1..50),
        ) {
            let mut s = Series::from_bars(stored);
            let expected = Series::from_bars(fetched.clone());
            s.merge(fetched);
            for want in expected.bars() {
                let got = s.bars().iter().find(|b| b.date == want.date).unwrap();
                prop_assert_eq!(got, want);
            }
        }
    }
}
