use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{PriceRecord, Ticker};

use crate::error::{MarketError, Result};

/// Provider of daily OHLCV bars.
///
/// Implementations return the rows they have for `[start, end]` (both inclusive),
/// sorted by date. An empty vector is a valid answer; the loader decides what it means.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Human readable provider name, used in logs and the health endpoint.
    fn name(&self) -> &str;

    async fn fetch_daily(
        &self,
        ticker: Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>>;
}

/// In-memory source serving fixed rows per ticker.
///
/// Counts fetches so callers can tell whether a request reached the source. Tickers
/// without rows answer with an empty vector, or with the configured error.
#[derive(Debug, Default)]
pub struct StaticSource {
    rows: HashMap<Ticker, Vec<PriceRecord>>,
    failure: Option<MarketError>,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, ticker: Ticker, rows: Vec<PriceRecord>) -> Self {
        self.rows.insert(ticker, rows);
        self
    }

    /// Makes every fetch fail, as an unreachable provider would.
    pub fn failing(mut self, error: MarketError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_daily(
        &self,
        ticker: Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        Ok(self
            .rows
            .get(&ticker)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.date >= start && r.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
