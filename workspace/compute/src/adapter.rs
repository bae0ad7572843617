use common::{ForecastFrame, HistoricalSeries};
use tracing::{debug, info, instrument, trace};

use crate::error::Result;
use crate::frame::training_frame;
use crate::model::{FittedModel, Prophet, ProphetConfig};

/// A fitted model and its prediction over history plus horizon.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub model: FittedModel,
    pub frame: ForecastFrame,
}

/// Fits the model to the closing prices of `series` and predicts `horizon_days` past its end.
#[instrument(skip(series, config), fields(ticker = %series.ticker, rows = series.len()))]
pub fn forecast(series: &HistoricalSeries, horizon_days: u32, config: &ProphetConfig) -> Result<Forecast> {
    trace!("Entering forecast");

    let training = training_frame(series)?;
    let model = Prophet::new(config.clone()).fit(&training)?;

    let future = model.make_future_dataframe(horizon_days as usize)?;
    debug!("Future frame has {} rows", future.height());

    let frame = model.predict(&future)?;
    info!(
        "Forecast for {} runs to {:?} ({} rows)",
        series.ticker,
        frame.last_date(),
        frame.len()
    );

    Ok(Forecast { model, frame })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComputeError;
    use chrono::{Datelike, Duration, NaiveDate};
    use common::{PriceRecord, Ticker};

    fn series(ticker: Ticker, from: NaiveDate, days: i64) -> HistoricalSeries {
        let records = (0..days)
            .map(|i| from + Duration::days(i))
            .filter(|d| d.weekday().number_from_monday() <= 5)
            .enumerate()
            .map(|(i, d)| {
                let close = 150.0 + (i as f64 * 0.05).sin() * 5.0 + i as f64 * 0.02;
                PriceRecord::new(d, close - 0.3, close + 1.0, close - 1.0, close, 1_000_000)
            })
            .collect();
        HistoricalSeries::new(ticker, records).unwrap()
    }

    fn config() -> ProphetConfig {
        ProphetConfig {
            uncertainty_samples: 200,
            ..ProphetConfig::default()
        }
    }

    #[test]
    fn test_one_month_horizon() {
        let history = series(Ticker::Aapl, NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(), 400);
        let result = forecast(&history, 30, &config()).unwrap();

        assert_eq!(result.model.history_dates().len(), history.len());
        assert_eq!(result.frame.len(), history.len() + 30);
        assert_eq!(result.frame.history_len, history.len());
        assert_eq!(
            result.frame.last_date(),
            history.last_date().map(|d| d + Duration::days(30))
        );
        assert_eq!(result.frame.first_date(), history.first_date());
    }

    #[test]
    fn test_every_horizon_extends_by_its_days() {
        let history = series(Ticker::Goog, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(), 120);
        for months in 1..=5u32 {
            let days = months * 30;
            let result = forecast(&history, days, &config()).unwrap();
            assert_eq!(result.frame.future_rows().len(), days as usize);
            assert_eq!(
                result.frame.last_date(),
                history.last_date().map(|d| d + Duration::days(days as i64))
            );
        }
    }

    #[test]
    fn test_identical_inputs_identical_frames() {
        let history = series(Ticker::Msft, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(), 200);
        let first = forecast(&history, 60, &config()).unwrap();
        let second = forecast(&history, 60, &config()).unwrap();
        assert_eq!(first.frame, second.frame);
    }

    #[test]
    fn test_too_short_history_fails() {
        let history = series(Ticker::Gme, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 1);
        let result = forecast(&history, 30, &config());
        assert!(matches!(result, Err(ComputeError::InsufficientData { .. })));
    }

    #[test]
    fn test_flat_history_fails() {
        let records = (1..=20)
            .map(|d| {
                PriceRecord::new(
                    NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                    10.0,
                    10.0,
                    10.0,
                    10.0,
                    0,
                )
            })
            .collect();
        let history = HistoricalSeries::new(Ticker::AkbnkIs, records).unwrap();
        let result = forecast(&history, 30, &config());
        assert!(matches!(result, Err(ComputeError::DegenerateVariance { .. })));
    }
}
