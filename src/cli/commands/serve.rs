use anyhow::Result;
use std::path::Path;
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace};

use crate::config::{AppConfig, initialize_app_state};
use crate::router::create_router;

pub async fn serve(config_path: Option<&Path>, bind_address: Option<&str>) -> Result<()> {
    trace!("Entering serve function");
    info!("Stockcast application starting up");
    debug!("Configuration file: {:?}", config_path);

    let mut config = match AppConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            return Err(e);
        }
    };
    if let Some(bind_address) = bind_address {
        config.server.bind_address = bind_address.to_string();
    }
    let bind_address = config.server.bind_address.clone();
    debug!("Bind address: {}", bind_address);

    // Initialize application state
    trace!("Initializing application state");
    let state = match initialize_app_state(config) {
        Ok(state) => {
            debug!("Application state initialized successfully");
            state
        }
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };

    // Create router
    trace!("Creating application router");
    let app = create_router(state);
    debug!("Router created successfully");

    // Start server
    info!("Starting server on {}", bind_address);
    trace!("Attempting to bind TCP listener to {}", bind_address);
    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => {
            debug!("Successfully bound to address: {}", bind_address);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", bind_address, e);
            return Err(e.into());
        }
    };

    info!("Stockcast dashboard running on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);
    debug!("Server is ready to accept connections");

    trace!("Starting axum server");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown gracefully");
    Ok(())
}
