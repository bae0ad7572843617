use common::{SeriesError, Ticker};
use thiserror::Error;

/// Error types for market data retrieval
#[derive(Error, Debug, Clone)]
pub enum MarketError {
    /// The HTTP request could not be sent or its body could not be read
    #[error("Request failed: {0}")]
    Request(String),

    /// The provider answered with something we could not decode
    #[error("Parse error: {0}")]
    Parse(String),

    /// The provider reported an error for the request
    #[error("API error [{code}]: {description}")]
    Api { code: String, description: String },

    /// The provider returned zero usable rows
    #[error("No data returned for {0}")]
    NoData(Ticker),

    /// Rows came back but do not form a valid series
    #[error("Invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),
}

impl From<reqwest::Error> for MarketError {
    fn from(error: reqwest::Error) -> Self {
        MarketError::Request(error.to_string())
    }
}

/// Type alias for Result with MarketError
pub type Result<T> = std::result::Result<T, MarketError>;
