use std::sync::{Arc, Mutex};
use std::time::Duration;

use cached::{Cached, TimedSizedCache};
use chrono::{NaiveDate, Utc};
use common::{HistoricalSeries, Ticker};
use tracing::{debug, info, instrument, warn};

use crate::error::{MarketError, Result};
use crate::source::MarketDataSource;

/// First day of history requested for every ticker.
pub fn default_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).expect("valid constant date")
}

/// Settings of a [`DataLoader`].
#[derive(Debug, Clone)]
pub struct LoaderSettings {
    pub history_start: NaiveDate,
    /// How long a loaded series is served from cache
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    /// Keep a trailing row dated today (a session that may still be running)
    pub include_partial_day: bool,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            history_start: default_history_start(),
            cache_ttl: Duration::from_secs(3600),
            cache_capacity: 16,
            include_partial_day: false,
        }
    }
}

/// Loads daily history per ticker and keeps it for a bounded time.
///
/// The cache is keyed by ticker alone and stores the load time with each entry;
/// entries older than the TTL are dropped on lookup. Failed loads are never cached.
pub struct DataLoader<C: Cached<Ticker, HistoricalSeries> = TimedSizedCache<Ticker, HistoricalSeries>> {
    source: Arc<dyn MarketDataSource>,
    cache: Mutex<C>,
    settings: LoaderSettings,
    /// Fixed "today", when the loader must not follow the wall clock
    today: Option<NaiveDate>,
}

impl DataLoader<TimedSizedCache<Ticker, HistoricalSeries>> {
    pub fn new(source: Arc<dyn MarketDataSource>, settings: LoaderSettings) -> Self {
        let store = TimedSizedCache::with_size_and_lifespan(
            settings.cache_capacity.max(1),
            settings.cache_ttl.as_secs(),
        );
        Self::new_with_store(source, store, settings)
    }

    pub fn with_defaults(source: Arc<dyn MarketDataSource>) -> Self {
        Self::new(source, LoaderSettings::default())
    }
}

impl<C: Cached<Ticker, HistoricalSeries>> DataLoader<C> {
    /// Creates a loader backed by a custom cache store.
    pub fn new_with_store(source: Arc<dyn MarketDataSource>, store: C, settings: LoaderSettings) -> Self {
        Self {
            source,
            cache: Mutex::new(store),
            settings,
            today: None,
        }
    }

    /// Pins the date used as the end of the requested range.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    /// Today's calendar date, evaluated at call time.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Returns the history of `ticker` from the configured start through today.
    ///
    /// Served from cache while the entry is younger than the TTL. An unreachable
    /// source or an empty answer is an error.
    #[instrument(skip(self))]
    pub async fn load(&self, ticker: Ticker) -> Result<HistoricalSeries> {
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(series) = cache.cache_get(&ticker) {
                debug!("{} served from cache ({} rows)", ticker, series.len());
                return Ok(series.clone());
            }
        }

        let today = self.today();
        let start = self.settings.history_start;
        info!(
            "Loading {} from {} through {} via {}",
            ticker,
            start.format("%Y-%m-%d"),
            today.format("%Y-%m-%d"),
            self.source.name()
        );

        let mut records = self.source.fetch_daily(ticker, start, today).await.map_err(|e| {
            warn!("Fetching {} failed: {}", ticker, e);
            e
        })?;

        if !self.settings.include_partial_day && records.last().is_some_and(|r| r.date >= today) {
            debug!("Dropping possibly incomplete session of {}", today);
            records.pop();
        }

        if records.is_empty() {
            warn!("No rows for {}", ticker);
            return Err(MarketError::NoData(ticker));
        }

        let series = HistoricalSeries::new(ticker, records)?;
        info!("Loaded {} rows for {}", series.len(), ticker);

        if let Ok(mut cache) = self.cache.lock() {
            cache.cache_set(ticker, series.clone());
        }

        Ok(series)
    }

    /// Drops every cached series.
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.cache_clear();
        }
    }

    pub fn cache_size(&self) -> usize {
        self.cache.lock().map(|cache| cache.cache_size()).unwrap_or(0)
    }
}
