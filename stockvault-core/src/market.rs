//! Markets and symbol identifiers.
//!
//! An `Ident` (symbol + market) is the primary key for a stored series and
//! the source of the provider-facing ticker. Yahoo's convention: Hong Kong
//! listings carry a `.HK` suffix, US listings are the bare symbol.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exchange a symbol is listed on. Doubles as the storage subdirectory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    Hk,
    Us,
}

impl Market {
    /// Directory and display name, e.g. `stock_data/HK/0700.csv`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Hk => "HK",
            Market::Us => "US",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = UnknownMarket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HK" => Ok(Market::Hk),
            "US" => Ok(Market::Us),
            _ => Err(UnknownMarket(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown market '{0}' (expected HK or US)")]
pub struct UnknownMarket(pub String);

/// (symbol, market) pair identifying one stored series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ident {
    pub symbol: String,
    pub market: Market,
}

impl Ident {
    pub fn new(symbol: impl Into<String>, market: Market) -> Self {
        Self {
            symbol: symbol.into(),
            market,
        }
    }

    /// Ticker string the provider expects.
    ///
    /// HK listings are suffixed (`0700` → `0700.HK`); everything else is the
    /// bare symbol. This mirrors the provider's convention exactly.
    pub fn provider_ticker(&self) -> String {
        match self.market {
            Market::Hk => format!("{}.HK", self.symbol),
            _ => self.symbol.clone(),
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbol, self.market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hk_ticker_gets_suffix() {
        let ident = Ident::new("0700", Market::Hk);
        assert_eq!(ident.provider_ticker(), "0700.HK");
    }

    #[test]
    fn us_ticker_is_bare_symbol() {
        let ident = Ident::new("AAPL", Market::Us);
        assert_eq!(ident.provider_ticker(), "AAPL");
    }

    #[test]
    fn market_parses_case_insensitively() {
        assert_eq!("hk".parse::<Market>().unwrap(), Market::Hk);
        assert_eq!("US".parse::<Market>().unwrap(), Market::Us);
        assert!("LSE".parse::<Market>().is_err());
    }
}
