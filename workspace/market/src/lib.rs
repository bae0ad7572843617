//! Market data loading: providers of daily bars and the caching loader in front of them.

pub mod error;
pub mod loader;
pub mod source;
pub mod yahoo;

pub use error::{MarketError, Result};
pub use loader::{DataLoader, LoaderSettings, default_history_start};
pub use source::{MarketDataSource, StaticSource};
pub use yahoo::YahooFinanceSource;
