//! Core market-data types shared across the pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// A single daily observation: trade date and closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// A chronologically ordered series of closing prices.
///
/// Construction enforces strictly increasing dates and finite prices, which
/// is the contract providers must honor. Everything downstream relies on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self> {
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ForecastError::InvalidData {
                    reason: format!(
                        "price series dates not strictly increasing at {}",
                        pair[1].date
                    ),
                });
            }
        }
        for point in &points {
            if !point.close.is_finite() {
                return Err(ForecastError::InvalidData {
                    reason: format!("non-finite close on {}", point.date),
                });
            }
        }

        Ok(PriceSeries { points })
    }

    pub fn empty() -> Self {
        PriceSeries { points: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Closing prices in series order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }
}

/// A supported ticker symbol with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerInfo {
    pub symbol: String,
    pub name: String,
}

/// The symbols the service advertises.
pub fn ticker_catalog() -> Vec<TickerInfo> {
    [
        ("AAPL", "Apple Inc."),
        ("MSFT", "Microsoft Corporation"),
        ("GOOGL", "Alphabet Inc."),
        ("AMZN", "Amazon.com Inc."),
        ("TSLA", "Tesla Inc."),
        ("META", "Meta Platforms Inc."),
        ("NVDA", "NVIDIA Corporation"),
        ("JPM", "JPMorgan Chase & Co."),
    ]
    .into_iter()
    .map(|(symbol, name)| TickerInfo {
        symbol: symbol.to_string(),
        name: name.to_string(),
    })
    .collect()
}
