pub mod adapter;
pub mod error;
pub mod frame;
pub mod model;

pub use adapter::{Forecast, forecast};
pub use error::{ComputeError, Result};
pub use model::seasonality::SeasonalityToggle;
pub use model::{FittedModel, Prophet, ProphetConfig};

/// Returns the model configuration used when nothing else is configured.
///
/// Seasonalities are chosen automatically from the history and the sampler is seeded with 0,
/// so the same history always gives the same intervals.
pub fn default_config() -> ProphetConfig {
    ProphetConfig::default()
}
