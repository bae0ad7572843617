//! Additive time series model: piecewise linear trend plus Fourier seasonalities.
//!
//! `y(t) = trend(t) + Σ seasonal(t) + ε`. Values are scaled by `max |y|` and time by the
//! span of the history before fitting; coefficients are the posterior mode under Gaussian
//! priors, which keeps the fit a single linear solve.

pub mod seasonality;
pub mod solver;
pub mod trend;
pub mod uncertainty;

use chrono::{Duration, NaiveDate};
use common::{ComponentProfile, ForecastFrame, ForecastRow, ProfilePoint};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{ComputeError, Result};
use crate::frame::{self, DS, Observations};

use self::seasonality::{Seasonality, SeasonalityToggle, WEEKLY, YEARLY, epoch_days, is_enabled};
use self::solver::{Design, ridge};
use self::trend::{PiecewiseLinear, changepoint_indices, hinge};
use self::uncertainty::{SampleInput, SampleSettings, sample_bands};

/// Prior standard deviation of the base rate and offset
const TREND_PRIOR_SCALE: f64 = 5.0;
/// Noise standard deviation assumed for the first solve, in scaled units
const INITIAL_SIGMA: f64 = 0.05;
/// Lower bound on the noise standard deviation, keeps the priors active on an exact fit
const MIN_SIGMA: f64 = 1e-4;

/// Model settings. Defaults follow the usual Prophet defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProphetConfig {
    pub n_changepoints: usize,
    /// Share of the history in which changepoints are placed
    pub changepoint_range: f64,
    /// Scale of the Laplace prior on rate changes
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub yearly_seasonality: SeasonalityToggle,
    pub weekly_seasonality: SeasonalityToggle,
    pub interval_width: f64,
    pub uncertainty_samples: usize,
    /// Seed of the uncertainty sampler
    pub seed: u64,
}

impl Default for ProphetConfig {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            yearly_seasonality: SeasonalityToggle::Auto,
            weekly_seasonality: SeasonalityToggle::Auto,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            seed: 0,
        }
    }
}

impl ProphetConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ComputeError::Config(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ComputeError::Config(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        if !(self.changepoint_prior_scale > 0.0) || !(self.seasonality_prior_scale > 0.0) {
            return Err(ComputeError::Config("prior scales must be positive".to_string()));
        }
        Ok(())
    }
}

/// Unfitted model.
#[derive(Debug, Clone, Default)]
pub struct Prophet {
    config: ProphetConfig,
}

/// A seasonal component together with its fitted coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedSeasonality {
    pub seasonality: Seasonality,
    pub beta: Vec<f64>,
}

impl Prophet {
    pub fn new(config: ProphetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProphetConfig {
        &self.config
    }

    /// Fits the model to a frame with a Date column `ds` and a numeric column `y`.
    #[instrument(skip(self, df), fields(rows = df.height()))]
    pub fn fit(&self, df: &DataFrame) -> Result<FittedModel> {
        self.config.validate()?;

        let observations = frame::read_training(df)?;
        check_observations(&observations)?;

        let first = observations.dates[0];
        let last = observations.dates[observations.len() - 1];
        let span_days = (last - first).num_days();
        if span_days == 0 {
            return Err(ComputeError::InsufficientData {
                required: 2,
                actual: 1,
            });
        }

        let y_scale = observations.values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let y: Vec<f64> = observations.values.iter().map(|v| v / y_scale).collect();
        let t: Vec<f64> = observations
            .dates
            .iter()
            .map(|d| (*d - first).num_days() as f64 / span_days as f64)
            .collect();

        let changepoints: Vec<f64> = changepoint_indices(
            observations.len(),
            self.config.n_changepoints,
            self.config.changepoint_range,
        )
        .into_iter()
        .map(|i| t[i])
        .collect();

        let min_spacing = observations
            .dates
            .windows(2)
            .map(|w| (w[1] - w[0]).num_days())
            .min()
            .unwrap_or(0);
        let seasonalities: Vec<Seasonality> = [
            (YEARLY, self.config.yearly_seasonality),
            (WEEKLY, self.config.weekly_seasonality),
        ]
        .into_iter()
        .filter(|(s, toggle)| is_enabled(s, *toggle, span_days, min_spacing))
        .map(|(s, _)| s)
        .collect();

        debug!(
            "Fitting {} rows over {} days, {} changepoints, seasonalities {:?}",
            observations.len(),
            span_days,
            changepoints.len(),
            seasonalities.iter().map(|s| s.name).collect::<Vec<_>>()
        );

        // Columns: k, m, one hinge per changepoint, then the Fourier terms
        let width = 2 + changepoints.len() + seasonalities.iter().map(|s| s.width()).sum::<usize>();
        let mut design = Design::new(width);
        let mut row = Vec::with_capacity(width);
        for (date, t) in observations.dates.iter().zip(&t) {
            row.clear();
            row.push(*t);
            row.push(1.0);
            row.extend(changepoints.iter().map(|s| hinge(*t, *s)));
            let days = epoch_days(*date);
            for seasonality in &seasonalities {
                row.extend(seasonality.features(days));
            }
            design.push_row(&row);
        }

        let trend_variance = TREND_PRIOR_SCALE * TREND_PRIOR_SCALE;
        // Laplace(0, τ) has variance 2τ²
        let delta_variance = 2.0 * self.config.changepoint_prior_scale.powi(2);
        let seasonal_variance = self.config.seasonality_prior_scale.powi(2);
        let mut priors = vec![trend_variance, trend_variance];
        priors.extend(std::iter::repeat_n(delta_variance, changepoints.len()));
        priors.extend(std::iter::repeat_n(seasonal_variance, width - priors.len()));

        let mut beta = ridge(&design, &y, &priors, INITIAL_SIGMA.powi(2))?;
        let mut sigma = residual_sigma(&design, &y, &beta);
        trace!("First pass noise estimate {}", sigma);
        beta = ridge(&design, &y, &priors, sigma.powi(2))?;
        sigma = residual_sigma(&design, &y, &beta);

        let mut offset = 2 + changepoints.len();
        let trend = PiecewiseLinear {
            k: beta[0],
            m: beta[1],
            deltas: beta[2..offset].to_vec(),
            changepoints,
        };
        let seasonalities = seasonalities
            .into_iter()
            .map(|seasonality| {
                let end = offset + seasonality.width();
                let fitted = FittedSeasonality {
                    beta: beta[offset..end].to_vec(),
                    seasonality,
                };
                offset = end;
                fitted
            })
            .collect();

        info!(
            "Fitted model on {} rows, growth {:.4}, noise {:.4}",
            observations.len(),
            trend.k,
            sigma * y_scale
        );

        Ok(FittedModel {
            config: self.config.clone(),
            history: observations,
            start: first,
            span_days: span_days as f64,
            y_scale,
            trend,
            seasonalities,
            sigma,
        })
    }
}

fn check_observations(observations: &Observations) -> Result<()> {
    if observations.len() < 2 {
        warn!("Only {} usable rows", observations.len());
        return Err(ComputeError::InsufficientData {
            required: 2,
            actual: observations.len(),
        });
    }

    let first = observations.values[0];
    if observations.values.iter().all(|v| *v == first) {
        warn!("All {} values equal {}", observations.len(), first);
        return Err(ComputeError::DegenerateVariance {
            count: observations.len(),
            value: first,
        });
    }
    Ok(())
}

fn residual_sigma(design: &Design, y: &[f64], beta: &[f64]) -> f64 {
    let fitted = design.predict(beta);
    let rss: f64 = fitted.iter().zip(y).map(|(f, y)| (y - f).powi(2)).sum();
    (rss / y.len() as f64).sqrt().max(MIN_SIGMA)
}

fn weekday_label(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

fn day_of_year_label(date: NaiveDate) -> String {
    date.format("%B %-d").to_string()
}

/// A model fitted to one history.
#[derive(Debug, Clone)]
pub struct FittedModel {
    config: ProphetConfig,
    history: Observations,
    start: NaiveDate,
    span_days: f64,
    y_scale: f64,
    trend: PiecewiseLinear,
    seasonalities: Vec<FittedSeasonality>,
    /// Noise standard deviation, scaled
    sigma: f64,
}

impl FittedModel {
    pub fn history_dates(&self) -> &[NaiveDate] {
        &self.history.dates
    }

    pub fn history_values(&self) -> &[f64] {
        &self.history.values
    }

    pub fn last_history_date(&self) -> Option<NaiveDate> {
        self.history.dates.last().copied()
    }

    /// Names of the fitted seasonal components.
    pub fn seasonalities(&self) -> Vec<&'static str> {
        self.seasonalities.iter().map(|s| s.seasonality.name).collect()
    }

    /// Dates of the trend changepoints.
    pub fn changepoints(&self) -> Vec<NaiveDate> {
        self.trend
            .changepoints
            .iter()
            .map(|t| self.start + Duration::days((t * self.span_days).round() as i64))
            .collect()
    }

    /// Noise standard deviation in price units.
    pub fn sigma(&self) -> f64 {
        self.sigma * self.y_scale
    }

    pub fn trend(&self) -> &PiecewiseLinear {
        &self.trend
    }

    /// Training dates followed by `periods` consecutive days.
    pub fn make_future_dataframe(&self, periods: usize) -> Result<DataFrame> {
        frame::future_frame(&self.history.dates, periods)
    }

    fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.span_days
    }

    fn component(&self, name: &str, date: NaiveDate) -> f64 {
        self.seasonalities
            .iter()
            .find(|s| s.seasonality.name == name)
            .map(|s| s.seasonality.value(epoch_days(date), &s.beta))
            .unwrap_or(0.0)
    }

    /// Predicts every date of the `ds` column of `df`.
    #[instrument(skip(self, df), fields(rows = df.height()))]
    pub fn predict(&self, df: &DataFrame) -> Result<ForecastFrame> {
        let mut dates = Vec::with_capacity(df.height());
        for date in frame::read_dates(df, DS)? {
            match date {
                Some(date) => dates.push(date),
                None => return Err(ComputeError::Date("null date in prediction frame".to_string())),
            }
        }

        let t: Vec<f64> = dates.iter().map(|d| self.scaled_time(*d)).collect();
        let weekly: Vec<f64> = dates.iter().map(|d| self.component(WEEKLY.name, *d)).collect();
        let yearly: Vec<f64> = dates.iter().map(|d| self.component(YEARLY.name, *d)).collect();
        let seasonal: Vec<f64> = weekly.iter().zip(&yearly).map(|(w, y)| w + y).collect();

        let bands = sample_bands(
            &SampleInput {
                trend: &self.trend,
                t: &t,
                seasonal: &seasonal,
                sigma: self.sigma,
                y_scale: self.y_scale,
            },
            SampleSettings {
                samples: self.config.uncertainty_samples,
                interval_width: self.config.interval_width,
                seed: self.config.seed,
            },
        )?;

        let scale = self.y_scale;
        let rows: Vec<ForecastRow> = dates
            .iter()
            .enumerate()
            .map(|(i, ds)| {
                let trend = self.trend.value(t[i]) * scale;
                let additive_terms = seasonal[i] * scale;
                ForecastRow {
                    ds: *ds,
                    trend,
                    trend_lower: bands.trend_lower[i],
                    trend_upper: bands.trend_upper[i],
                    weekly: weekly[i] * scale,
                    yearly: yearly[i] * scale,
                    additive_terms,
                    yhat_lower: bands.yhat_lower[i],
                    yhat_upper: bands.yhat_upper[i],
                    yhat: trend + additive_terms,
                }
            })
            .collect();

        let last = self.last_history_date();
        let history_len = rows.iter().filter(|r| Some(r.ds) <= last).count();
        debug!("Predicted {} rows, {} in history", rows.len(), history_len);

        Ok(ForecastFrame::new(rows, history_len))
    }

    /// Shape of a seasonal component over one cycle, or `None` when it was not fitted.
    ///
    /// The weekly profile runs Sunday to Saturday, the yearly one from Jan 1 to Dec 31.
    pub fn seasonal_profile(&self, name: &str) -> Option<ComponentProfile> {
        let fitted = self.seasonalities.iter().find(|s| s.seasonality.name == name)?;
        // 2017-01-01 is a Sunday and 2017 is not a leap year
        let origin = NaiveDate::from_ymd_opt(2017, 1, 1)?;

        let (days, label): (i64, fn(NaiveDate) -> String) = match fitted.seasonality.name {
            "weekly" => (7, weekday_label),
            _ => (365, day_of_year_label),
        };

        let points = (0..days)
            .map(|offset| {
                let date = origin + Duration::days(offset);
                ProfilePoint {
                    label: label(date),
                    value: fitted.seasonality.value(epoch_days(date), &fitted.beta) * self.y_scale,
                }
            })
            .collect();

        Some(ComponentProfile {
            name: name.to_string(),
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Datelike;
    use polars::prelude::{NamedFrom, Series};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn frame_of(dates: Vec<NaiveDate>, values: Vec<f64>) -> DataFrame {
        DataFrame::new(vec![
            Series::new(DS.into(), dates).into(),
            Series::new(frame::Y.into(), values).into(),
        ])
        .unwrap()
    }

    /// Business days with a linear drift and a weekday pattern.
    fn weekday_frame(from: NaiveDate, days: i64) -> DataFrame {
        let (dates, values): (Vec<_>, Vec<_>) = (0..days)
            .map(|i| from + Duration::days(i))
            .filter(|d| d.weekday().number_from_monday() <= 5)
            .map(|d| {
                let i = (d - from).num_days() as f64;
                let bump = if d.weekday() == chrono::Weekday::Mon { 2.0 } else { 0.0 };
                (d, 100.0 + 0.1 * i + bump)
            })
            .unzip();
        frame_of(dates, values)
    }

    fn quick_config() -> ProphetConfig {
        ProphetConfig {
            uncertainty_samples: 100,
            ..ProphetConfig::default()
        }
    }

    #[test]
    fn test_fit_linear_series() {
        let dates: Vec<_> = (0..60).map(|i| date(2024, 1, 1) + Duration::days(i)).collect();
        let values: Vec<_> = (0..60).map(|i| 50.0 + i as f64).collect();
        let config = ProphetConfig {
            weekly_seasonality: SeasonalityToggle::Off,
            ..quick_config()
        };

        let model = Prophet::new(config).fit(&frame_of(dates, values)).unwrap();
        let future = model.make_future_dataframe(10).unwrap();
        let forecast = model.predict(&future).unwrap();

        assert_eq!(forecast.len(), 70);
        assert_eq!(forecast.history_len, 60);
        assert_relative_eq!(forecast.rows[0].yhat, 50.0, epsilon = 0.5);
        assert_relative_eq!(forecast.rows[59].yhat, 109.0, epsilon = 0.5);
        // the trend keeps going up past the history
        assert!(forecast.rows[69].yhat > forecast.rows[59].yhat);
        assert!(model.seasonalities().is_empty());
        assert_eq!(forecast.rows[65].weekly, 0.0);
    }

    #[test]
    fn test_weekly_seasonality_is_detected() {
        let model = Prophet::new(quick_config())
            .fit(&weekday_frame(date(2023, 1, 2), 120))
            .unwrap();

        assert_eq!(model.seasonalities(), vec!["weekly"]);
        let profile = model.seasonal_profile("weekly").unwrap();
        assert_eq!(profile.points.len(), 7);
        assert_eq!(profile.points[0].label, "Sunday");

        let monday = profile.points[1].value;
        let wednesday = profile.points[3].value;
        assert!(monday > wednesday);
        assert!(model.seasonal_profile("yearly").is_none());
    }

    #[test]
    fn test_yearly_profile_covers_a_year() {
        let model = Prophet::new(quick_config())
            .fit(&weekday_frame(date(2018, 1, 1), 800))
            .unwrap();

        assert_eq!(model.seasonalities(), vec!["yearly", "weekly"]);
        let profile = model.seasonal_profile("yearly").unwrap();
        assert_eq!(profile.points.len(), 365);
        assert_eq!(profile.points[0].label, "January 1");
        assert_eq!(profile.points[364].label, "December 31");
    }

    #[test]
    fn test_bounds_surround_prediction() {
        let model = Prophet::new(quick_config())
            .fit(&weekday_frame(date(2023, 1, 2), 200))
            .unwrap();
        let forecast = model.predict(&model.make_future_dataframe(30).unwrap()).unwrap();

        for row in &forecast.rows {
            assert!(row.yhat_lower <= row.yhat_upper);
            assert!(row.trend_lower <= row.trend_upper);
            assert_relative_eq!(row.yhat, row.trend + row.additive_terms, epsilon = 1e-9);
            assert_relative_eq!(row.additive_terms, row.weekly + row.yearly, epsilon = 1e-9);
        }
        let history_row = &forecast.rows[0];
        assert_relative_eq!(history_row.trend_lower, history_row.trend, epsilon = 1e-9);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let df = weekday_frame(date(2023, 1, 2), 150);
        let predict = || {
            let model = Prophet::new(quick_config()).fit(&df).unwrap();
            model.predict(&model.make_future_dataframe(60).unwrap()).unwrap()
        };
        assert_eq!(predict(), predict());
    }

    #[test]
    fn test_changepoints_fall_in_first_part_of_history() {
        let model = Prophet::new(quick_config())
            .fit(&weekday_frame(date(2023, 1, 2), 365))
            .unwrap();

        let changepoints = model.changepoints();
        assert_eq!(changepoints.len(), 25);
        let cutoff = date(2023, 1, 2) + Duration::days(365 * 8 / 10 + 1);
        assert!(changepoints.iter().all(|d| *d < cutoff));
    }

    #[test]
    fn test_single_row_is_insufficient() {
        let df = frame_of(vec![date(2024, 1, 1)], vec![10.0]);
        let result = Prophet::default().fit(&df);
        assert!(matches!(
            result,
            Err(ComputeError::InsufficientData { required: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_constant_series_is_degenerate() {
        let dates: Vec<_> = (0..30).map(|i| date(2024, 1, 1) + Duration::days(i)).collect();
        let df = frame_of(dates, vec![42.0; 30]);
        assert!(matches!(
            Prophet::default().fit(&df),
            Err(ComputeError::DegenerateVariance { count: 30, .. })
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ProphetConfig {
            interval_width: 1.5,
            ..ProphetConfig::default()
        };
        let df = weekday_frame(date(2023, 1, 2), 30);
        assert!(matches!(Prophet::new(config).fit(&df), Err(ComputeError::Config(_))));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ProphetConfig =
            serde_json::from_str(r#"{"weekly_seasonality": "off", "seed": 7}"#).unwrap();
        assert_eq!(config.weekly_seasonality, SeasonalityToggle::Off);
        assert_eq!(config.seed, 7);
        assert_eq!(config.n_changepoints, 25);
    }
}
