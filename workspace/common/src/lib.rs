//! Common transport-layer types shared by the data loader, the forecast engine and the server.
//! Handlers serialize these directly, so field names double as the JSON contract.

mod forecast;
mod selection;
mod series;

pub use forecast::{ComponentProfile, ForecastFrame, ForecastRow, ProfilePoint};
pub use selection::{Horizon, Selection, SelectionError, Ticker};
pub use series::{HistoricalSeries, PriceRecord, SeriesError};
