use crate::handlers::{
    dashboard::dashboard_page,
    forecast::get_stock_forecast,
    health::health_check,
    stocks::{get_stock_history, get_tickers},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{routing::get, Router};
use axum_prometheus::PrometheusMetricLayer;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    // The metrics recorder is process global, so it is never installed under test
    let metrics_enabled = state.config.server.metrics_enabled && !cfg!(test);

    let router = Router::new()
        // Dashboard page
        .route("/", get(dashboard_page))
        // Health check
        .route("/health", get(health_check))
        // API v1 routes
        .route("/api/v1/tickers", get(get_tickers))
        .route("/api/v1/stocks/:ticker/history", get(get_stock_history))
        .route("/api/v1/stocks/:ticker/forecast", get(get_stock_forecast))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let router = if metrics_enabled {
        info!("Prometheus metrics exposed on /metrics");
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router
            .route(
                "/metrics",
                get(move || {
                    let handle = metric_handle.clone();
                    async move { handle.render() }
                }),
            )
            .layer(prometheus_layer)
    } else {
        router
    };

    router
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
