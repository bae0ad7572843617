//! One dashboard run: load, show the raw data, fit, show the forecast.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use common::{HistoricalSeries, Horizon, Selection, SelectionError, Ticker};
use compute::{ComputeError, Forecast, ProphetConfig};
use market::{DataLoader, MarketError};
use thiserror::Error;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::render::{Status, Surface, Widget, render_forecast, render_raw};

pub const APP_TITLE: &str = "Stock Forecast App";

/// Why a run, or one of its stages, did not produce its output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(#[from] SelectionError),

    #[error("No market data for {ticker}: {reason}")]
    DataUnavailable { ticker: Ticker, reason: String },

    #[error("Could not forecast {ticker}: {reason}")]
    ForecastUnavailable { ticker: Ticker, reason: String },
}

impl PipelineError {
    pub fn data_unavailable(ticker: Ticker, error: &MarketError) -> Self {
        PipelineError::DataUnavailable {
            ticker,
            reason: error.to_string(),
        }
    }

    pub fn forecast_unavailable(ticker: Ticker, error: &ComputeError) -> Self {
        PipelineError::ForecastUnavailable {
            ticker,
            reason: error.to_string(),
        }
    }

    /// Stable identifier used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidSelection(_) => "INVALID_SELECTION",
            PipelineError::DataUnavailable { .. } => "DATA_UNAVAILABLE",
            PipelineError::ForecastUnavailable { .. } => "FORECAST_UNAVAILABLE",
        }
    }

    fn panel_title(&self) -> &'static str {
        match self {
            PipelineError::InvalidSelection(_) => "Invalid selection",
            PipelineError::DataUnavailable { .. } => "Data unavailable",
            PipelineError::ForecastUnavailable { .. } => "Forecast unavailable",
        }
    }

    /// Panel shown in place of the section that failed.
    pub fn to_widget(&self) -> Widget {
        Widget::Failure {
            title: self.panel_title().to_string(),
            message: self.to_string(),
        }
    }
}

/// Which stage a failed run stopped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    DataUnavailable,
    ForecastUnavailable,
}

/// Stages of a run, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    LoadingData,
    DataLoaded,
    RawRendered,
    Fitting,
    Forecasted,
    Rendered,
    Failed(FailureKind),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Rendered {
        history_rows: usize,
        forecast_rows: usize,
        last_forecast_date: Option<NaiveDate>,
    },
    Failed(PipelineError),
}

/// Trace of one run, for logs and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub selection: Selection,
    pub states: Vec<RunState>,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn final_state(&self) -> RunState {
        self.states.last().copied().unwrap_or(RunState::Idle)
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self.outcome, RunOutcome::Rendered { .. })
    }
}

/// The dashboard: owns the data loader (and with it the only state kept between runs)
/// and the model settings.
pub struct Dashboard {
    loader: Arc<DataLoader>,
    forecast_config: ProphetConfig,
}

impl fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dashboard")
            .field("source", &self.loader.source_name())
            .field("cached_series", &self.loader.cache_size())
            .field("forecast_config", &self.forecast_config)
            .finish()
    }
}

impl Dashboard {
    pub fn new(loader: Arc<DataLoader>, forecast_config: ProphetConfig) -> Self {
        Self {
            loader,
            forecast_config,
        }
    }

    pub fn loader(&self) -> &DataLoader {
        &self.loader
    }

    /// Loads the history of `ticker`; every loader failure is reported as unavailable data.
    pub async fn load(&self, ticker: Ticker) -> Result<HistoricalSeries, PipelineError> {
        self.loader.load(ticker).await.map_err(|e| {
            warn!("Data for {} unavailable: {}", ticker, e);
            PipelineError::data_unavailable(ticker, &e)
        })
    }

    /// Fits the model to `series` and predicts `horizon` past its end.
    ///
    /// The fit runs on the blocking pool, keeping the async workers (and request timeouts)
    /// responsive while it lasts.
    pub async fn forecast(&self, series: &HistoricalSeries, horizon: Horizon) -> Result<Forecast, PipelineError> {
        let ticker = series.ticker;
        let history = series.clone();
        let config = self.forecast_config.clone();

        let fitted = tokio::task::spawn_blocking(move || compute::forecast(&history, horizon.days(), &config))
            .await
            .map_err(|e| {
                error!("Model fit task for {} did not complete: {}", ticker, e);
                PipelineError::ForecastUnavailable {
                    ticker,
                    reason: format!("fit task failed: {}", e),
                }
            })?;

        fitted.map_err(|e| {
            if e.is_data_rejection() {
                warn!("Model rejected the history of {}: {}", ticker, e);
            } else {
                error!("Model fit for {} failed: {}", ticker, e);
            }
            PipelineError::forecast_unavailable(ticker, &e)
        })
    }

    /// Runs the whole pipeline for `selection`, pushing every widget into `surface`.
    ///
    /// A failed stage leaves a failure panel where its output would have been. A data failure
    /// ends the run before any fitting.
    #[instrument(skip(self, surface), fields(ticker = %selection.ticker, months = selection.horizon.months()))]
    pub async fn run<S: Surface + Send + ?Sized>(&self, selection: Selection, surface: &mut S) -> RunReport {
        trace!("Entering run");
        let mut states = vec![RunState::Idle];

        surface.push(Widget::Title(APP_TITLE.to_string()));

        states.push(RunState::LoadingData);
        surface.push(Widget::Status(Status::LoadingStarted));
        let series = match self.load(selection.ticker).await {
            Ok(series) => series,
            Err(e) => {
                surface.push(e.to_widget());
                states.push(RunState::Failed(FailureKind::DataUnavailable));
                return RunReport {
                    selection,
                    states,
                    outcome: RunOutcome::Failed(e),
                };
            }
        };
        surface.push(Widget::Status(Status::LoadingFinished));
        states.push(RunState::DataLoaded);
        debug!("{} rows loaded for {}", series.len(), selection.ticker);

        render_raw(&series, surface);
        states.push(RunState::RawRendered);

        states.push(RunState::Fitting);
        let forecast = match self.forecast(&series, selection.horizon).await {
            Ok(forecast) => forecast,
            Err(e) => {
                surface.push(e.to_widget());
                states.push(RunState::Failed(FailureKind::ForecastUnavailable));
                return RunReport {
                    selection,
                    states,
                    outcome: RunOutcome::Failed(e),
                };
            }
        };
        states.push(RunState::Forecasted);

        render_forecast(&forecast.model, &forecast.frame, selection.horizon, surface);
        states.push(RunState::Rendered);

        info!(
            "Run for {} finished, forecast through {:?}",
            selection.ticker,
            forecast.frame.last_date()
        );

        RunReport {
            selection,
            states,
            outcome: RunOutcome::Rendered {
                history_rows: series.len(),
                forecast_rows: forecast.frame.len(),
                last_forecast_date: forecast.frame.last_date(),
            },
        }
    }
}
