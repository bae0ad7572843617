use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether a seasonal component is fitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityToggle {
    /// Decided from the span and spacing of the history
    #[default]
    Auto,
    On,
    Off,
}

/// A periodic component modelled by a truncated Fourier series.
#[derive(Debug, Clone, PartialEq)]
pub struct Seasonality {
    pub name: &'static str,
    /// Period in days
    pub period: f64,
    pub order: usize,
}

pub const YEARLY: Seasonality = Seasonality {
    name: "yearly",
    period: 365.25,
    order: 10,
};

pub const WEEKLY: Seasonality = Seasonality {
    name: "weekly",
    period: 7.0,
    order: 3,
};

impl Seasonality {
    /// Number of regression columns: a sine and a cosine per order.
    pub fn width(&self) -> usize {
        2 * self.order
    }

    /// Fourier features at `t` days since the Unix epoch.
    pub fn features(&self, t: f64) -> Vec<f64> {
        let mut features = Vec::with_capacity(self.width());
        for i in 1..=self.order {
            let x = 2.0 * std::f64::consts::PI * i as f64 * t / self.period;
            features.push(x.sin());
            features.push(x.cos());
        }
        features
    }

    /// Component value at `t` for fitted coefficients, in scaled units.
    pub fn value(&self, t: f64, beta: &[f64]) -> f64 {
        super::solver::dot(&self.features(t), beta)
    }
}

/// Days since 1970-01-01, the absolute time axis the seasonal terms use.
pub fn epoch_days(date: NaiveDate) -> f64 {
    date.signed_duration_since(NaiveDate::default()).num_days() as f64
}

/// Resolves a toggle against the history.
///
/// Yearly needs two years of history. Weekly needs two weeks and observations closer than a
/// week apart.
pub fn is_enabled(seasonality: &Seasonality, toggle: SeasonalityToggle, span_days: i64, min_spacing_days: i64) -> bool {
    match toggle {
        SeasonalityToggle::On => true,
        SeasonalityToggle::Off => false,
        SeasonalityToggle::Auto if seasonality.period > 7.0 => span_days >= 730,
        SeasonalityToggle::Auto => span_days >= 14 && min_spacing_days < 7,
    }
}
