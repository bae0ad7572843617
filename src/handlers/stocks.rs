use crate::pipeline::PipelineError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, HistoryQuery, TickersResponse, pipeline_error_response};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{HistoricalSeries, Horizon, Ticker};
use tracing::{debug, info, instrument, trace, warn};

/// List the tickers offered for prediction
#[utoipa::path(
    get,
    path = "/api/v1/tickers",
    tag = "stocks",
    responses(
        (status = 200, description = "Tickers retrieved successfully", body = ApiResponse<TickersResponse>)
    )
)]
#[instrument]
pub async fn get_tickers() -> Result<(StatusCode, Json<ApiResponse<TickersResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_tickers function");

    let response = ApiResponse {
        data: TickersResponse {
            tickers: Ticker::ALL.to_vec(),
            months: Horizon::allowed_months(),
            default_ticker: Ticker::default(),
            default_months: Horizon::default().months(),
        },
        message: "Tickers retrieved successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Get the daily price history of a ticker
#[utoipa::path(
    get,
    path = "/api/v1/stocks/{ticker}/history",
    tag = "stocks",
    params(
        ("ticker" = String, Path, description = "Ticker symbol, e.g. GOOG"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "Price history retrieved successfully", body = ApiResponse<HistoricalSeries>),
        (status = 400, description = "Unknown ticker", body = ErrorResponse),
        (status = 502, description = "Market data unavailable", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_stock_history(
    Path(ticker): Path<String>,
    Valid(Query(query)): Valid<Query<HistoryQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<HistoricalSeries>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_stock_history function");

    let ticker: Ticker = ticker.parse().map_err(|e| {
        warn!("Rejected history request: {}", e);
        pipeline_error_response(&PipelineError::from(e))
    })?;
    debug!("Fetching history for {} (tail: {:?})", ticker, query.tail);

    let series = state
        .dashboard
        .load(ticker)
        .await
        .map_err(|e| pipeline_error_response(&e))?;

    let series = match query.tail {
        Some(n) => series.tail_series(n),
        None => series,
    };
    info!("Returning {} history rows for {}", series.len(), ticker);

    let response = ApiResponse {
        data: series,
        message: "Price history retrieved successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::OK, Json(response)))
}
