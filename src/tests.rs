#[cfg(test)]
mod integration_tests {
    use crate::schemas::{ApiResponse, ForecastResponse, HealthResponse, TickersResponse};
    use crate::test_utils::test_utils::{setup_test_app, setup_test_app_state};
    use crate::router::create_router;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::{Duration, NaiveDate};
    use common::{HistoricalSeries, Ticker};

    fn last_trading_day() -> NaiveDate {
        // The test loader's today is Friday 2024-06-14; its own row is dropped as incomplete
        NaiveDate::from_ymd_opt(2024, 6, 13).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: HealthResponse = response.json();
        assert_eq!(body.status, "healthy");
        assert_eq!(body.data_source, "static");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_get_tickers() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/v1/tickers").await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<TickersResponse> = response.json();
        assert!(body.success);
        assert_eq!(
            body.data.tickers,
            vec![Ticker::Goog, Ticker::Aapl, Ticker::Msft, Ticker::Gme, Ticker::AkbnkIs]
        );
        assert_eq!(body.data.months, vec![1, 2, 3, 4, 5]);
        assert_eq!(body.data.default_ticker, Ticker::Goog);
        assert_eq!(body.data.default_months, 1);
    }

    #[tokio::test]
    async fn test_get_history_tail() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/v1/stocks/GOOG/history").add_query_param("tail", 5).await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<HistoricalSeries> = response.json();
        assert!(body.success);
        assert_eq!(body.data.ticker, Ticker::Goog);
        assert_eq!(body.data.len(), 5);
        assert_eq!(body.data.last_date(), Some(last_trading_day()));
        assert!(body.data.records.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[tokio::test]
    async fn test_get_history_starts_at_configured_date() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/v1/stocks/msft/history").await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<HistoricalSeries> = response.json();
        assert_eq!(body.data.ticker, Ticker::Msft);
        assert_eq!(body.data.first_date(), NaiveDate::from_ymd_opt(2022, 1, 3));
    }

    #[tokio::test]
    async fn test_get_history_unknown_ticker() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/v1/stocks/TSLA/history").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let error_body: serde_json::Value = response.json();
        assert_eq!(error_body["success"], false);
        assert_eq!(error_body["code"], "INVALID_SELECTION");
        assert!(error_body["error"].as_str().unwrap().contains("TSLA"));
    }

    #[tokio::test]
    async fn test_get_history_without_data() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/v1/stocks/AKBNK.IS/history").await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        let error_body: serde_json::Value = response.json();
        assert_eq!(error_body["success"], false);
        assert_eq!(error_body["code"], "DATA_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_forecast_one_month() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let history: ApiResponse<HistoricalSeries> = server.get("/api/v1/stocks/AAPL/history").await.json();

        let response = server.get("/api/v1/stocks/AAPL/forecast").add_query_param("months", 1).await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<ForecastResponse> = response.json();
        assert!(body.success);
        let data = body.data;
        assert_eq!(data.ticker, Ticker::Aapl);
        assert_eq!(data.months, 1);
        assert_eq!(data.horizon_days, 30);
        assert_eq!(data.history_rows, history.data.len());
        assert_eq!(data.forecast.len(), history.data.len() + 30);
        assert_eq!(data.forecast.history_len, history.data.len());
        assert_eq!(data.forecast.first_date(), history.data.first_date());
        assert_eq!(data.forecast.last_date(), Some(last_trading_day() + Duration::days(30)));
        for row in &data.forecast.rows {
            assert!(row.yhat_lower <= row.yhat_upper);
            assert!(row.trend_lower <= row.trend_upper);
        }
    }

    #[tokio::test]
    async fn test_forecast_five_months_tail() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server
            .get("/api/v1/stocks/GOOG/forecast")
            .add_query_param("months", 5)
            .add_query_param("tail", 10)
            .await;

        response.assert_status(StatusCode::OK);
        let body: ApiResponse<ForecastResponse> = response.json();
        assert_eq!(body.data.horizon_days, 150);
        assert_eq!(body.data.forecast.len(), 10);
        assert_eq!(body.data.forecast.history_len, 0);
        assert_eq!(
            body.data.forecast.last_date(),
            Some(last_trading_day() + Duration::days(150))
        );
    }

    #[tokio::test]
    async fn test_forecast_is_repeatable() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let first: ApiResponse<ForecastResponse> = server
            .get("/api/v1/stocks/MSFT/forecast")
            .add_query_param("tail", 5)
            .await
            .json();
        let second: ApiResponse<ForecastResponse> = server
            .get("/api/v1/stocks/MSFT/forecast")
            .add_query_param("tail", 5)
            .await
            .json();

        assert_eq!(first.data.forecast, second.data.forecast);
    }

    #[tokio::test]
    async fn test_forecast_months_out_of_range() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        for months in [0, 6] {
            let response = server
                .get("/api/v1/stocks/GOOG/forecast")
                .add_query_param("months", months)
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            let error_body: serde_json::Value = response.json();
            assert_eq!(error_body["success"], false);
            assert_eq!(error_body["code"], "INVALID_SELECTION");
            assert!(error_body["error"].as_str().unwrap().contains("between 1 and 5"));
        }
    }

    #[tokio::test]
    async fn test_forecast_of_flat_history_is_rejected() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/v1/stocks/GME/forecast").await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let error_body: serde_json::Value = response.json();
        assert_eq!(error_body["success"], false);
        assert_eq!(error_body["code"], "FORECAST_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_forecast_without_data() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/v1/stocks/AKBNK.IS/forecast").add_query_param("months", 2).await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        let error_body: serde_json::Value = response.json();
        assert_eq!(error_body["code"], "DATA_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_dashboard_default_selection() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/").await;

        response.assert_status(StatusCode::OK);
        let html = response.text();
        assert!(html.contains("<h1>Stock Forecast App</h1>"));
        assert!(html.contains("<option value=\"GOOG\" selected>GOOG</option>"));
        assert!(html.contains("value=\"1\""));
        assert!(html.contains("Loading data... done!"));
        assert!(html.contains("<h3>Raw data</h3>"));
        assert!(html.contains("<h3>Forecast data</h3>"));
        assert!(html.contains("Forecast plot for 1 months"));
        assert!(html.contains("<h3>Forecast components</h3>"));
        assert!(html.contains("Plotly.newPlot(\"forecast-chart\""));
    }

    #[tokio::test]
    async fn test_dashboard_selection_from_query() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server
            .get("/")
            .add_query_param("ticker", "AAPL")
            .add_query_param("months", 3)
            .await;

        response.assert_status(StatusCode::OK);
        let html = response.text();
        assert!(html.contains("<option value=\"AAPL\" selected>AAPL</option>"));
        assert!(html.contains("Forecast plot for 3 months"));
        assert!(html.contains("raw-chart-aapl"));
    }

    #[tokio::test]
    async fn test_dashboard_shows_data_failure_inline() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/").add_query_param("ticker", "AKBNK.IS").await;

        response.assert_status(StatusCode::OK);
        let html = response.text();
        assert!(html.contains("<strong>Data unavailable</strong>"));
        assert!(!html.contains("<h3>Raw data</h3>"));
        assert!(!html.contains("<h3>Forecast data</h3>"));
    }

    #[tokio::test]
    async fn test_dashboard_shows_fit_failure_inline() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/").add_query_param("ticker", "GME").await;

        response.assert_status(StatusCode::OK);
        let html = response.text();
        assert!(html.contains("<h3>Raw data</h3>"));
        assert!(html.contains("<strong>Forecast unavailable</strong>"));
        assert!(!html.contains("<h3>Forecast data</h3>"));
    }

    #[tokio::test]
    async fn test_dashboard_rejects_unknown_ticker() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/").add_query_param("ticker", "TSLA").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let html = response.text();
        assert!(html.contains("<strong>Invalid selection</strong>"));
        assert!(html.contains("TSLA"));
    }

    #[tokio::test]
    async fn test_dashboard_rejects_months_out_of_range() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/").add_query_param("months", 6).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let html = response.text();
        assert!(html.contains("<strong>Invalid selection</strong>"));
        assert!(html.contains("got 6"));
        assert!(!html.contains("<h3>Raw data</h3>"));
    }

    #[tokio::test]
    async fn test_history_is_cached_between_requests() {
        let state = setup_test_app_state();
        let server = TestServer::new(create_router(state.clone())).unwrap();

        server.get("/api/v1/stocks/GOOG/history").await.assert_status(StatusCode::OK);
        server.get("/").await.assert_status(StatusCode::OK);

        assert_eq!(state.dashboard.loader().cache_size(), 1);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api-docs/openapi.json").await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["info"]["title"], "Stockcast API");
        assert!(body["paths"]["/api/v1/stocks/{ticker}/forecast"].is_object());
    }

    #[tokio::test]
    async fn test_prometheus_metrics_endpoint() {
        let app = setup_test_app();
        let server = TestServer::new(app).unwrap();

        // In test mode, Prometheus metrics are disabled to avoid conflicts
        let response = server.get("/metrics").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
