//! CSV file store, one file per (symbol, market).
//!
//! Layout: `{root}/{MARKET}/{SYMBOL}.csv` with a header row and ISO dates.
//! Market directories are created lazily on path resolution. Saves rewrite
//! the whole file through a `.tmp` sibling renamed into place, so a reader
//! never observes a half-written series.

use crate::market::Ident;
use crate::series::{Bar, Series};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error at {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        StoreError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// On-disk store rooted at a single directory.
pub struct CsvStore {
    root: PathBuf,
}

impl CsvStore {
    /// Root directory used when none is configured.
    pub const DEFAULT_ROOT: &'static str = "stock_data";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical file path for an identifier, creating the market directory
    /// (and any missing ancestors) on the way.
    pub fn symbol_path(&self, ident: &Ident) -> Result<PathBuf, StoreError> {
        let market_dir = self.root.join(ident.market.as_str());
        fs::create_dir_all(&market_dir).map_err(|e| StoreError::io(&market_dir, e))?;
        Ok(market_dir.join(format!("{}.csv", ident.symbol)))
    }

    /// Load the stored series for an identifier. A missing file is a routine
    /// `None`, not an error.
    pub fn load(&self, ident: &Ident) -> Result<Option<Series>, StoreError> {
        let path = self.symbol_path(ident)?;
        if !path.exists() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|e| StoreError::csv(&path, e))?;
        let mut bars = Vec::new();
        for record in reader.deserialize::<Bar>() {
            bars.push(record.map_err(|e| StoreError::csv(&path, e))?);
        }

        Ok(Some(Series::from_bars(bars)))
    }

    /// Persist a series, replacing any previous file in full.
    pub fn save(&self, ident: &Ident, series: &Series) -> Result<(), StoreError> {
        let path = self.symbol_path(ident)?;
        let tmp_path = path.with_extension("csv.tmp");

        let mut writer =
            csv::Writer::from_path(&tmp_path).map_err(|e| StoreError::csv(&tmp_path, e))?;
        for bar in series.bars() {
            writer
                .serialize(bar)
                .map_err(|e| StoreError::csv(&tmp_path, e))?;
        }
        writer
            .flush()
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        drop(writer);

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::io(&path, e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Market;
    use chrono::NaiveDate;
    use std::env;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_root() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = env::temp_dir().join(format!("stockvault_store_{}_{id}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn sample_series() -> Series {
        Series::from_bars(vec![
            Bar {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                open: 100.0,
                high: 102.0,
                low: 99.0,
                close: 101.0,
                volume: 1000,
            },
            Bar {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                open: 101.0,
                high: 103.0,
                low: 100.0,
                close: 102.0,
                volume: 1100,
            },
        ])
    }

    #[test]
    fn path_is_rooted_per_market_and_dirs_exist() {
        let root = temp_root();
        let store = CsvStore::new(&root);

        let path = store.symbol_path(&Ident::new("0700", Market::Hk)).unwrap();
        assert_eq!(path, root.join("HK").join("0700.csv"));
        assert!(root.join("HK").is_dir());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let root = temp_root();
        let store = CsvStore::new(&root);
        let ident = Ident::new("AAPL", Market::Us);

        store.save(&ident, &sample_series()).unwrap();
        let loaded = store.load(&ident).unwrap().unwrap();

        assert_eq!(loaded, sample_series());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn load_missing_file_is_none() {
        let root = temp_root();
        let store = CsvStore::new(&root);

        let loaded = store.load(&Ident::new("MSFT", Market::Us)).unwrap();
        assert!(loaded.is_none());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn save_rewrites_the_whole_file() {
        let root = temp_root();
        let store = CsvStore::new(&root);
        let ident = Ident::new("AAPL", Market::Us);

        store.save(&ident, &sample_series()).unwrap();
        let shorter = Series::from_bars(vec![Bar {
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1,
        }]);
        store.save(&ident, &shorter).unwrap();

        let loaded = store.load(&ident).unwrap().unwrap();
        assert_eq!(loaded, shorter);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn csv_header_and_date_format_are_stable() {
        let root = temp_root();
        let store = CsvStore::new(&root);
        let ident = Ident::new("AAPL", Market::Us);

        store.save(&ident, &sample_series()).unwrap();
        let path = store.symbol_path(&ident).unwrap();
        let content = fs::read_to_string(path).unwrap();

        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("date,open,high,low,close,volume"));
        assert!(lines.next().unwrap().starts_with("2024-01-02,"));

        let _ = fs::remove_dir_all(&root);
    }
}
