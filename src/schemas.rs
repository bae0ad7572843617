use axum::{http::StatusCode, response::Json};
use common::{ForecastFrame, ForecastRow, HistoricalSeries, PriceRecord, Ticker};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};
use validator::Validate;

use crate::config::AppConfig;
use crate::pipeline::{Dashboard, PipelineError};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Load, forecast and render pipeline; owns the market data cache
    pub dashboard: Arc<Dashboard>,
    /// Configuration the state was built from
    pub config: Arc<AppConfig>,
}

/// Query parameters of the dashboard page
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// Ticker symbol (default: GOOG)
    pub ticker: Option<String>,
    /// Months of prediction, 1 to 5 (default: 1); other values are an invalid selection
    pub months: Option<u32>,
}

/// Query parameters for history endpoints
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Return only the last N rows
    #[validate(range(min = 1, max = 100000))]
    pub tail: Option<usize>,
}

/// Query parameters for forecast endpoints
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct ForecastQuery {
    /// Months of prediction, 1 to 5 (default: 1); other values are an invalid selection
    pub months: Option<u32>,
    /// Return only the last N rows
    #[validate(range(min = 1, max = 100000))]
    pub tail: Option<usize>,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            success: false,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Market data source in use
    pub data_source: String,
}

/// Tickers offered for prediction
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TickersResponse {
    pub tickers: Vec<Ticker>,
    /// Allowed values of the `months` parameter
    pub months: Vec<u32>,
    pub default_ticker: Ticker,
    pub default_months: u32,
}

/// Forecast of one ticker over the requested horizon
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ForecastResponse {
    pub ticker: Ticker,
    pub months: u32,
    pub horizon_days: u32,
    /// Number of historical rows the model was fitted on
    pub history_rows: usize,
    pub forecast: ForecastFrame,
}

/// HTTP status and JSON body for a failed pipeline stage.
pub fn pipeline_error_response(err: &PipelineError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        PipelineError::InvalidSelection(_) => StatusCode::BAD_REQUEST,
        PipelineError::DataUnavailable { .. } => StatusCode::BAD_GATEWAY,
        PipelineError::ForecastUnavailable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(ErrorResponse::new(err.to_string(), err.code())))
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::dashboard::dashboard_page,
        crate::handlers::stocks::get_tickers,
        crate::handlers::stocks::get_stock_history,
        crate::handlers::forecast::get_stock_forecast,
    ),
    components(
        schemas(
            ApiResponse<TickersResponse>,
            ApiResponse<HistoricalSeries>,
            ApiResponse<ForecastResponse>,
            ErrorResponse,
            HealthResponse,
            TickersResponse,
            ForecastResponse,
            DashboardQuery,
            HistoryQuery,
            ForecastQuery,
            Ticker,
            PriceRecord,
            HistoricalSeries,
            ForecastRow,
            ForecastFrame,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "dashboard", description = "Interactive forecast page"),
        (name = "stocks", description = "Ticker list and price history endpoints"),
        (name = "forecast", description = "Price forecast endpoints"),
    ),
    info(
        title = "Stockcast API",
        description = "Stock price forecasting dashboard: daily price history and trend/seasonality forecasts",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
