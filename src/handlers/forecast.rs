use crate::pipeline::PipelineError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, ForecastQuery, ForecastResponse, pipeline_error_response};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{Horizon, Ticker};
use tracing::{debug, info, instrument, trace, warn};

/// Forecast the closing price of a ticker
///
/// The model is fitted on the full loaded history; `tail` only trims the returned rows.
#[utoipa::path(
    get,
    path = "/api/v1/stocks/{ticker}/forecast",
    tag = "forecast",
    params(
        ("ticker" = String, Path, description = "Ticker symbol, e.g. GOOG"),
        ForecastQuery
    ),
    responses(
        (status = 200, description = "Forecast computed successfully", body = ApiResponse<ForecastResponse>),
        (status = 400, description = "Unknown ticker or months out of range", body = ErrorResponse),
        (status = 422, description = "History cannot be modeled", body = ErrorResponse),
        (status = 502, description = "Market data unavailable", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_stock_forecast(
    Path(ticker): Path<String>,
    Valid(Query(query)): Valid<Query<ForecastQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<ForecastResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_stock_forecast function");

    let ticker: Ticker = ticker.parse().map_err(|e| {
        warn!("Rejected forecast request: {}", e);
        pipeline_error_response(&PipelineError::from(e))
    })?;
    let horizon = match query.months {
        Some(months) => Horizon::from_months(months)
            .map_err(|e| pipeline_error_response(&PipelineError::from(e)))?,
        None => Horizon::default(),
    };
    debug!("Forecasting {} over {} days", ticker, horizon.days());

    let series = state
        .dashboard
        .load(ticker)
        .await
        .map_err(|e| pipeline_error_response(&e))?;

    let forecast = state
        .dashboard
        .forecast(&series, horizon)
        .await
        .map_err(|e| pipeline_error_response(&e))?;

    let frame = match query.tail {
        Some(n) => forecast.frame.tail_frame(n),
        None => forecast.frame,
    };
    info!(
        "Forecast for {} through {:?} ({} rows returned)",
        ticker,
        frame.last_date(),
        frame.len()
    );

    let response = ApiResponse {
        data: ForecastResponse {
            ticker,
            months: horizon.months(),
            horizon_days: horizon.days(),
            history_rows: series.len(),
            forecast: frame,
        },
        message: "Forecast computed successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::OK, Json(response)))
}
