use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::Ticker;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("Dates must be strictly increasing: {previous} is followed by {next}")]
    NotIncreasing { previous: NaiveDate, next: NaiveDate },
}

/// One trading day of a security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Close adjusted for splits and dividends, when the source provides it
    pub adj_close: Option<f64>,
    pub volume: u64,
}

impl PriceRecord {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            adj_close: None,
            volume,
        }
    }

    pub fn with_adj_close(mut self, adj_close: f64) -> Self {
        self.adj_close = Some(adj_close);
        self
    }
}

/// Daily history of one ticker, ordered by date with no duplicates.
///
/// Non-trading days are simply absent; nothing is gap-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoricalSeries {
    pub ticker: Ticker,
    pub records: Vec<PriceRecord>,
}

impl HistoricalSeries {
    /// Creates a series, checking that dates are strictly increasing.
    pub fn new(ticker: Ticker, records: Vec<PriceRecord>) -> Result<Self, SeriesError> {
        if let Some(pair) = records.windows(2).find(|pair| pair[0].date >= pair[1].date) {
            return Err(SeriesError::NotIncreasing {
                previous: pair[0].date,
                next: pair[1].date,
            });
        }
        Ok(Self { ticker, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// The last `n` records (all of them when the series is shorter).
    pub fn tail(&self, n: usize) -> &[PriceRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.close).collect()
    }

    /// Copy of this series containing only the last `n` records.
    pub fn tail_series(&self, n: usize) -> HistoricalSeries {
        HistoricalSeries {
            ticker: self.ticker,
            records: self.tail(n).to_vec(),
        }
    }
}
