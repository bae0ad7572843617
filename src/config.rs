use anyhow::{Context, Result};
use chrono::NaiveDate;
use compute::ProphetConfig;
use market::{DataLoader, LoaderSettings, MarketDataSource, YahooFinanceSource, default_history_start};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::pipeline::Dashboard;
use crate::schemas::AppState;

/// Name of the optional configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "stockcast";
/// Prefix of configuration environment variables, e.g. `STOCKCAST__SERVER__BIND_ADDRESS`.
pub const ENV_PREFIX: &str = "STOCKCAST";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub request_timeout_secs: u64,
    /// Expose Prometheus metrics on `/metrics`
    pub metrics_enabled: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 60,
            metrics_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketSettings {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub history_start: NaiveDate,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub include_partial_day: bool,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            base_url: market::yahoo::DEFAULT_BASE_URL.to_string(),
            user_agent: market::yahoo::DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 20,
            history_start: default_history_start(),
            cache_ttl_secs: 3600,
            cache_capacity: 16,
            include_partial_day: false,
        }
    }
}

impl MarketSettings {
    pub fn loader_settings(&self) -> LoaderSettings {
        LoaderSettings {
            history_start: self.history_start,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            cache_capacity: self.cache_capacity,
            include_partial_day: self.include_partial_day,
        }
    }
}

/// Application configuration: built-in defaults, then the config file, then the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub market: MarketSettings,
    pub forecast: ProphetConfig,
}

impl AppConfig {
    /// Loads the configuration. `path` replaces the default `stockcast.{toml,yaml,json}` lookup
    /// and must exist when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;

        debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Parses a TOML document on top of the defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.forecast.validate().context("Invalid [forecast] section")?;
        anyhow::ensure!(self.market.cache_capacity > 0, "market.cache_capacity must be positive");
        anyhow::ensure!(self.server.request_timeout_secs > 0, "server.request_timeout_secs must be positive");
        Ok(())
    }
}

/// Builds the dashboard over the live Yahoo Finance source.
pub fn build_dashboard(config: &AppConfig) -> Result<Dashboard> {
    let source = YahooFinanceSource::new(
        &config.market.base_url,
        &config.market.user_agent,
        Duration::from_secs(config.market.request_timeout_secs),
    )
    .context("Failed to create market data client")?;

    Ok(dashboard_with_source(config, Arc::new(source), None))
}

/// Builds the dashboard over any market data source, optionally with a pinned "today".
pub fn dashboard_with_source(
    config: &AppConfig,
    source: Arc<dyn MarketDataSource>,
    today: Option<NaiveDate>,
) -> Dashboard {
    let mut loader = DataLoader::new(source, config.market.loader_settings());
    if let Some(today) = today {
        loader = loader.with_today(today);
    }
    Dashboard::new(Arc::new(loader), config.forecast.clone())
}

/// Initialize application configuration and state
pub fn initialize_app_state(config: AppConfig) -> Result<AppState> {
    info!("Using market data from {}", config.market.base_url);
    let dashboard = build_dashboard(&config)?;

    Ok(AppState {
        dashboard: Arc::new(dashboard),
        config: Arc::new(config),
    })
}

/// Application state over a given source, used by tests and offline runs.
pub fn app_state_with_source(
    config: AppConfig,
    source: Arc<dyn MarketDataSource>,
    today: Option<NaiveDate>,
) -> AppState {
    let dashboard = dashboard_with_source(&config, source, today);
    AppState {
        dashboard: Arc::new(dashboard),
        config: Arc::new(config),
    }
}
