//! Yahoo Finance chart API source.
//!
//! Requests `{base_url}/{symbol}?period1=..&period2=..&interval=1d` and turns the
//! columnar `indicators.quote` block into [`PriceRecord`]s. Timestamps mark the session
//! open in exchange time, so they are shifted by `meta.gmtoffset` before taking the date.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use common::{PriceRecord, Ticker};
use serde::Deserialize;
use tracing::{debug, instrument, trace, warn};

use crate::error::{MarketError, Result};
use crate::source::MarketDataSource;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) stockcast/0.1";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
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
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
    adjclose: Option<Vec<AdjCloseColumn>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseColumn {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// HTTP client for the Yahoo Finance chart endpoint
#[derive(Debug, Clone)]
pub struct YahooFinanceSource {
    client: reqwest::Client,
    base_url: String,
}

impl YahooFinanceSource {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client with the public endpoint and a 20 second timeout.
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL, DEFAULT_USER_AGENT, Duration::from_secs(20))
    }

    fn build_url(&self, ticker: Ticker, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            ticker.symbol(),
            day_start_timestamp(start),
            // period2 is exclusive, so ask up to the start of the following day
            day_start_timestamp(end) + 86_400,
        )
    }
}

fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

#[async_trait]
impl MarketDataSource for YahooFinanceSource {
    fn name(&self) -> &str {
        "yahoo-finance"
    }

    #[instrument(skip(self))]
    async fn fetch_daily(
        &self,
        ticker: Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>> {
        let url = self.build_url(ticker, start, end);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        trace!("{} answered {} with {} bytes", ticker, status, body.len());

        // Unknown symbols come back as 404 with a regular chart.error payload
        match parse_chart(&body) {
            Err(MarketError::Parse(reason)) if !status.is_success() => {
                warn!("{} request failed with status {}", ticker, status);
                Err(MarketError::Request(format!("HTTP {}: {}", status, reason)))
            }
            other => other,
        }
    }
}

/// Decodes a chart API payload into date-ordered records.
///
/// Rows with any missing OHLCV value are skipped. When the provider repeats a date
/// (it does so for the running session) the later row wins.
pub(crate) fn parse_chart(body: &str) -> Result<Vec<PriceRecord>> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(e.to_string()))?;

    if let Some(error) = response.chart.error {
        return Err(MarketError::Api {
            code: error.code,
            description: error.description,
        });
    }

    let Some(data) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let adj_close = data
        .indicators
        .adjclose
        .and_then(|columns| columns.into_iter().next())
        .map(|column| column.adjclose)
        .unwrap_or_default();

    let mut records: Vec<PriceRecord> = Vec::with_capacity(data.timestamp.len());
    for (i, timestamp) in data.timestamp.iter().enumerate() {
        let value = |column: &[Option<f64>]| column.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            value(&quote.open),
            value(&quote.high),
            value(&quote.low),
            value(&quote.close),
            quote.volume.get(i).copied().flatten(),
        ) else {
            trace!("Skipping incomplete row at index {}", i);
            continue;
        };

        let Some(date) = DateTime::from_timestamp(timestamp + data.meta.gmtoffset, 0)
            .map(|dt| dt.date_naive())
        else {
            return Err(MarketError::Parse(format!("Invalid timestamp {}", timestamp)));
        };

        let mut record = PriceRecord::new(date, open, high, low, close, volume);
        record.adj_close = value(&adj_close);

        // Timestamps arrive in ascending order, so a repeated date is always the previous row
        match records.last_mut() {
            Some(previous) if previous.date == date => *previous = record,
            _ => records.push(record),
        }
    }

    Ok(records)
}
