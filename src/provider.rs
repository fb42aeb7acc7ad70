//! Market data providers
//!
//! [`MarketDataProvider`] is the seam between the forecasting pipeline and
//! wherever closing prices actually come from. [`SyntheticProvider`] serves
//! deterministic random walks for the built-in catalog, which keeps the
//! pipeline fully testable offline; [`CsvProvider`] reads one CSV file per
//! ticker for replaying exported history.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use serde::Deserialize;
use tracing::debug;

use crate::calendar::is_trading_day;
use crate::data::{ticker_catalog, PricePoint, PriceSeries};
use crate::error::{ForecastError, Result};

/// Source of daily closing prices for a ticker
pub trait MarketDataProvider: Send + Sync {
    /// Fetch closes in `[start, end]`, oldest first. An unknown ticker
    /// yields an empty series rather than an error.
    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries>;

    /// Fetch the trailing `days` calendar days up to today.
    fn fetch_latest(&self, ticker: &str, days: u32) -> Result<PriceSeries> {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(days as i64);
        self.fetch(ticker, start, end)
    }
}

impl<T: MarketDataProvider + ?Sized> MarketDataProvider for Box<T> {
    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        (**self).fetch(ticker, start, end)
    }
}

/// Deterministic random-walk provider for the built-in ticker catalog
///
/// Each ticker's walk is seeded from a hash of its symbol, so repeated
/// fetches of the same range return identical prices.
pub struct SyntheticProvider {
    symbols: Vec<String>,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        SyntheticProvider {
            symbols: ticker_catalog().into_iter().map(|info| info.symbol).collect(),
        }
    }

    pub fn with_symbols(symbols: Vec<String>) -> Self {
        SyntheticProvider { symbols }
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        SyntheticProvider::new()
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        let ticker = ticker.trim().to_uppercase();
        if !self.symbols.iter().any(|s| s == &ticker) {
            return Ok(PriceSeries::empty());
        }

        let mut hasher = DefaultHasher::new();
        ticker.hash(&mut hasher);
        let seed = hasher.finish();

        let mut rng = StdRng::seed_from_u64(seed);
        let daily_returns = Normal::new(0.0005, 0.02)
            .map_err(|e| ForecastError::Provider(format!("bad return distribution: {}", e)))?;

        let mut price = 20.0 + (seed % 480) as f64 * 0.5;
        let mut points = Vec::new();
        let mut date = start;
        while date <= end {
            if is_trading_day(date) {
                price *= 1.0 + rng.sample(daily_returns);
                price = price.max(1.0);
                points.push(PricePoint { date, close: price });
            }
            date += Duration::days(1);
        }

        debug!(ticker = %ticker, points = points.len(), "generated synthetic series");
        PriceSeries::new(points)
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Close")]
    close: f64,
}

/// Provider backed by one `{TICKER}.csv` file per symbol
///
/// Files need `date` and `close` columns (capitalized headers are accepted
/// too). Rows outside the requested range are skipped; a missing file is an
/// unknown ticker, not an error.
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        CsvProvider { dir: dir.into() }
    }
}

impl MarketDataProvider for CsvProvider {
    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        let ticker = ticker.trim().to_uppercase();
        let path = self.dir.join(format!("{}.csv", ticker));
        if !path.exists() {
            return Ok(PriceSeries::empty());
        }

        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| ForecastError::Provider(format!("open {}: {}", path.display(), e)))?;

        let mut points = Vec::new();
        for row in reader.deserialize() {
            let row: CsvRow = row
                .map_err(|e| ForecastError::Provider(format!("parse {}: {}", path.display(), e)))?;
            if row.date >= start && row.date <= end {
                points.push(PricePoint {
                    date: row.date,
                    close: row.close,
                });
            }
        }

        PriceSeries::new(points)
    }
}
