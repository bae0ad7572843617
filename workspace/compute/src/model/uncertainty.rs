//! Simulated uncertainty intervals.
//!
//! Each sample extends the fitted trend with random future changepoints, whose count,
//! placement and size follow what the history showed, then adds observation noise.
//! Interval bounds are quantiles over the samples.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};
use tracing::{debug, trace};

use super::trend::PiecewiseLinear;
use crate::error::{ComputeError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSettings {
    pub samples: usize,
    /// Probability mass between the lower and upper bound
    pub interval_width: f64,
    pub seed: u64,
}

/// Lower and upper bounds per prediction row, in price units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bands {
    pub trend_lower: Vec<f64>,
    pub trend_upper: Vec<f64>,
    pub yhat_lower: Vec<f64>,
    pub yhat_upper: Vec<f64>,
}

/// Everything a sample is drawn from. Scaled values are divided by `y_scale`.
pub struct SampleInput<'a> {
    pub trend: &'a PiecewiseLinear,
    /// Scaled time of each prediction row
    pub t: &'a [f64],
    /// Scaled seasonal component of each prediction row
    pub seasonal: &'a [f64],
    /// Scaled noise standard deviation
    pub sigma: f64,
    pub y_scale: f64,
}

pub fn sample_bands(input: &SampleInput<'_>, settings: SampleSettings) -> Result<Bands> {
    let rows = input.t.len();
    let scale = input.y_scale;

    if settings.samples == 0 {
        debug!("Uncertainty sampling disabled");
        let trend: Vec<f64> = input.t.iter().map(|t| input.trend.value(*t) * scale).collect();
        let yhat: Vec<f64> = trend
            .iter()
            .zip(input.seasonal)
            .map(|(tr, s)| tr + s * scale)
            .collect();
        return Ok(Bands {
            trend_lower: trend.clone(),
            trend_upper: trend,
            yhat_lower: yhat.clone(),
            yhat_upper: yhat,
        });
    }

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let noise = Normal::new(0.0, input.sigma)
        .map_err(|e| ComputeError::Config(format!("noise distribution: {}", e)))?;
    let t_max = input.t.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut trend_samples = vec![Vec::with_capacity(settings.samples); rows];
    let mut yhat_samples = vec![Vec::with_capacity(settings.samples); rows];

    for _ in 0..settings.samples {
        let trend = sample_trend(input.trend, t_max, &mut rng)?;
        for i in 0..rows {
            let trend_value = trend.value(input.t[i]) * scale;
            let yhat = trend_value + (input.seasonal[i] + noise.sample(&mut rng)) * scale;
            trend_samples[i].push(trend_value);
            yhat_samples[i].push(yhat);
        }
    }

    let lower_q = (1.0 - settings.interval_width) / 2.0;
    let upper_q = (1.0 + settings.interval_width) / 2.0;
    trace!("Interval quantiles {} / {}", lower_q, upper_q);

    let mut bands = Bands::default();
    for (mut trend, mut yhat) in trend_samples.into_iter().zip(yhat_samples) {
        sort(&mut trend);
        sort(&mut yhat);
        bands.trend_lower.push(quantile(&trend, lower_q));
        bands.trend_upper.push(quantile(&trend, upper_q));
        bands.yhat_lower.push(quantile(&yhat, lower_q));
        bands.yhat_upper.push(quantile(&yhat, upper_q));
    }

    Ok(bands)
}

/// One possible future of the trend.
///
/// Changepoints keep arriving past the end of history (`t > 1`) at the rate they were placed
/// in the history, with Laplace distributed rate changes scaled to the fitted ones.
fn sample_trend(trend: &PiecewiseLinear, t_max: f64, rng: &mut StdRng) -> Result<PiecewiseLinear> {
    let rate = trend.changepoints.len() as f64 * (t_max - 1.0);
    if rate <= 0.0 {
        return Ok(trend.clone());
    }

    let poisson = Poisson::new(rate)
        .map_err(|e| ComputeError::Config(format!("changepoint distribution: {}", e)))?;
    let count = poisson.sample(rng) as usize;
    if count == 0 {
        return Ok(trend.clone());
    }

    let mut changepoints: Vec<f64> = (0..count).map(|_| 1.0 + rng.gen_range(0.0..(t_max - 1.0))).collect();
    sort(&mut changepoints);

    let scale = trend.mean_abs_delta() + 1e-8;
    let deltas: Vec<f64> = (0..count).map(|_| laplace(scale, rng)).collect();

    Ok(trend.extended(&changepoints, &deltas))
}

/// Laplace(0, scale) draw by inverting the CDF.
fn laplace(scale: f64, rng: &mut StdRng) -> f64 {
    let u: f64 = rng.gen_range(-0.5..0.5);
    -scale * u.signum() * (1.0 - 2.0 * u.abs()).ln()
}

fn sort(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

/// Quantile of sorted values with linear interpolation between neighbours.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let below = position.floor() as usize;
    let above = (below + 1).min(sorted.len() - 1);
    let fraction = position - below as f64;
    sorted[below] + fraction * (sorted[above] - sorted[below])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_trend() -> PiecewiseLinear {
        PiecewiseLinear {
            k: 0.2,
            m: 0.5,
            deltas: vec![0.05, -0.05],
            changepoints: vec![0.3, 0.6],
        }
    }

    fn settings(samples: usize) -> SampleSettings {
        SampleSettings {
            samples,
            interval_width: 0.8,
            seed: 0,
        }
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(quantile(&values, 0.5), 3.0);
        assert_relative_eq!(quantile(&values, 0.1), 1.4);
        assert_relative_eq!(quantile(&values, 0.9), 4.6);
        assert_relative_eq!(quantile(&values, 1.0), 5.0);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_bands_bracket_the_trend() {
        let trend = flat_trend();
        let t = vec![0.0, 0.5, 1.0, 1.2, 1.5];
        let seasonal = vec![0.0; t.len()];
        let input = SampleInput {
            trend: &trend,
            t: &t,
            seasonal: &seasonal,
            sigma: 0.01,
            y_scale: 100.0,
        };

        let bands = sample_bands(&input, settings(500)).unwrap();

        for (i, t) in t.iter().enumerate() {
            let center = trend.value(*t) * 100.0;
            assert!(bands.yhat_lower[i] < center && center < bands.yhat_upper[i]);
            assert!(bands.trend_lower[i] <= bands.trend_upper[i]);
        }
        // no sampled changepoints can act inside the history
        assert_relative_eq!(bands.trend_lower[2], bands.trend_upper[2], epsilon = 1e-9);
        assert_relative_eq!(bands.trend_lower[1], trend.value(0.5) * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_future_interval_widens() {
        let trend = flat_trend();
        let t = vec![1.0, 1.1, 1.5];
        let seasonal = vec![0.0; t.len()];
        let input = SampleInput {
            trend: &trend,
            t: &t,
            seasonal: &seasonal,
            sigma: 0.001,
            y_scale: 1.0,
        };

        let bands = sample_bands(&input, settings(1000)).unwrap();
        let width = |i: usize| bands.trend_upper[i] - bands.trend_lower[i];
        assert!(width(2) > width(1));
        assert!(width(1) >= width(0));
    }

    #[test]
    fn test_same_seed_same_bands() {
        let trend = flat_trend();
        let t = vec![0.5, 1.0, 1.3];
        let seasonal = vec![0.01, -0.01, 0.0];
        let input = SampleInput {
            trend: &trend,
            t: &t,
            seasonal: &seasonal,
            sigma: 0.02,
            y_scale: 50.0,
        };

        let first = sample_bands(&input, settings(200)).unwrap();
        let second = sample_bands(&input, settings(200)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_samples_collapses_bands() {
        let trend = flat_trend();
        let t = vec![0.0, 1.5];
        let seasonal = vec![0.1, 0.1];
        let input = SampleInput {
            trend: &trend,
            t: &t,
            seasonal: &seasonal,
            sigma: 0.02,
            y_scale: 10.0,
        };

        let bands = sample_bands(&input, settings(0)).unwrap();
        assert_eq!(bands.yhat_lower, bands.yhat_upper);
        assert_relative_eq!(bands.yhat_lower[0], (trend.value(0.0) + 0.1) * 10.0);
    }
}
