//! Stockvault CLI — update, inspect, and stream cached market data.
//!
//! Commands:
//! - `update` — incrementally extend the stored series for each SYMBOL:MARKET
//! - `show` — print the tail of a locally stored series
//! - `intraday` — fetch recent 1-minute bars (not persisted)

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stockvault_core::{CsvStore, Ident, Market, StdoutProgress, Warehouse, YahooProvider};

#[derive(Parser)]
#[command(
    name = "stockvault",
    about = "Stockvault CLI — incremental local warehouse for equity price series"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Incrementally update stored series for the given identifiers.
    Update {
        /// Identifiers as SYMBOL:MARKET (e.g. 0700:HK AAPL:US).
        #[arg(required = true)]
        idents: Vec<String>,

        /// Store root directory.
        #[arg(long, default_value = CsvStore::DEFAULT_ROOT)]
        root: PathBuf,
    },
    /// Print the tail of a locally stored series.
    Show {
        /// Identifier as SYMBOL:MARKET.
        ident: String,

        /// Store root directory.
        #[arg(long, default_value = CsvStore::DEFAULT_ROOT)]
        root: PathBuf,

        /// Number of trailing rows to print.
        #[arg(long, default_value_t = 10)]
        tail: usize,
    },
    /// Fetch recent 1-minute bars from the provider (never persisted).
    Intraday {
        /// Identifier as SYMBOL:MARKET.
        ident: String,

        /// Provider lookback token (e.g. 1d, 5d).
        #[arg(long, default_value = "1d")]
        lookback: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Update { idents, root } => run_update(&idents, root),
        Commands::Show { ident, root, tail } => run_show(&ident, root, tail),
        Commands::Intraday { ident, lookback } => run_intraday(&ident, &lookback),
    }
}

/// Parse "SYMBOL:MARKET" into an identifier.
fn parse_ident(s: &str) -> Result<Ident> {
    let Some((symbol, market)) = s.rsplit_once(':') else {
        bail!("expected SYMBOL:MARKET, got '{s}'");
    };
    if symbol.is_empty() {
        bail!("empty symbol in '{s}'");
    }
    let market: Market = market.parse()?;
    Ok(Ident::new(symbol, market))
}

fn run_update(idents: &[String], root: PathBuf) -> Result<()> {
    let idents: Vec<Ident> = idents
        .iter()
        .map(|s| parse_ident(s))
        .collect::<Result<_>>()?;

    let provider = YahooProvider::new();
    let warehouse = Warehouse::new(&provider, CsvStore::new(root));
    let today = chrono::Local::now().date_naive();

    let summary = warehouse.batch_update(&idents, today, &StdoutProgress);
    println!(
        "done: {} updated, {} without new data, {} fetch failures, {} store errors (of {})",
        summary.updated, summary.no_data, summary.fetch_failed, summary.store_errors, summary.total
    );

    // Fetch failures are routine skips; store errors are fatal to the run.
    if summary.store_errors > 0 {
        bail!("{} identifier(s) hit store errors", summary.store_errors);
    }

    Ok(())
}

fn run_show(ident: &str, root: PathBuf, tail: usize) -> Result<()> {
    let ident = parse_ident(ident)?;
    let provider = YahooProvider::new();
    let warehouse = Warehouse::new(&provider, CsvStore::new(root));

    match warehouse.local_series(&ident)? {
        Some(series) => {
            let bars = series.bars();
            let skip = bars.len().saturating_sub(tail);
            println!("{} — {} bars", ident, bars.len());
            println!(
                "{:<12} {:>10} {:>10} {:>10} {:>10} {:>12}",
                "date", "open", "high", "low", "close", "volume"
            );
            for bar in &bars[skip..] {
                println!(
                    "{:<12} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12}",
                    bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
                );
            }
        }
        None => println!("no local data found for {ident}"),
    }

    Ok(())
}

fn run_intraday(ident: &str, lookback: &str) -> Result<()> {
    let ident = parse_ident(ident)?;
    let provider = YahooProvider::new();
    let warehouse = Warehouse::new(&provider, CsvStore::new(CsvStore::DEFAULT_ROOT));

    match warehouse.intraday(&ident, lookback) {
        Some(bars) if !bars.is_empty() => {
            println!("{} — {} minute bars", ident, bars.len());
            println!(
                "{:<20} {:>10} {:>10} {:>10} {:>10} {:>12}",
                "timestamp", "open", "high", "low", "close", "volume"
            );
            for bar in &bars {
                println!(
                    "{:<20} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12}",
                    bar.timestamp, bar.open, bar.high, bar.low, bar.close, bar.volume
                );
            }
        }
        Some(_) => println!("no intraday data for {ident}"),
        None => println!("intraday fetch failed for {ident} (see log)"),
    }

    Ok(())
}
