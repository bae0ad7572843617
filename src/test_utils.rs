#[cfg(test)]
pub mod test_utils {
    use crate::config::{AppConfig, app_state_with_source};
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use chrono::{Datelike, NaiveDate};
    use common::{PriceRecord, Ticker};
    use compute::ProphetConfig;
    use market::StaticSource;
    use std::sync::Arc;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Fixed "today" of every test loader (a Friday).
    pub fn test_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
    }

    /// Model settings with fewer uncertainty samples, to keep test runs quick.
    pub fn test_forecast_config() -> ProphetConfig {
        ProphetConfig {
            uncertainty_samples: 100,
            ..ProphetConfig::default()
        }
    }

    /// Business days from `from` through `to` with a drifting, wavy close.
    pub fn business_days(from: NaiveDate, to: NaiveDate, base: f64) -> Vec<PriceRecord> {
        from.iter_days()
            .take_while(|d| *d <= to)
            .filter(|d| d.weekday().number_from_monday() <= 5)
            .enumerate()
            .map(|(i, d)| {
                let step = i as f64;
                let close = base + step * 0.05 + (step / 15.0).sin() * 3.0;
                PriceRecord::new(d, close - 0.4, close + 1.2, close - 1.1, close, 1_000_000 + i as u64 * 10)
                    .with_adj_close(close * 0.99)
            })
            .collect()
    }

    /// Source with regular data for GOOG, AAPL and MSFT, a flat GME series the model rejects,
    /// and nothing at all for AKBNK.IS.
    pub fn static_source() -> StaticSource {
        let from = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let today = test_today();
        let flat = business_days(from, today, 20.0)
            .into_iter()
            .map(|r| PriceRecord::new(r.date, 20.0, 20.0, 20.0, 20.0, 1_000))
            .collect();

        StaticSource::new()
            .with_rows(Ticker::Goog, business_days(from, today, 120.0))
            .with_rows(Ticker::Aapl, business_days(from, today, 180.0))
            .with_rows(Ticker::Msft, business_days(from, today, 330.0))
            .with_rows(Ticker::Gme, flat)
    }

    /// Configuration for tests: two and a half years of history, metrics off.
    pub fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.market.history_start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        config.forecast = test_forecast_config();
        config.server.metrics_enabled = false;
        config
    }

    /// Create AppState for testing
    pub fn setup_test_app_state() -> AppState {
        app_state_with_source(test_config(), Arc::new(static_source()), Some(test_today()))
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable, defaulting to WARN
    /// if not set.
    ///
    /// # Returns
    ///
    /// A guard that will clean up the subscriber when dropped.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub fn setup_test_app() -> Router {
        let _guard = init_test_tracing();

        let state = setup_test_app_state();
        create_router(state)
    }
}
