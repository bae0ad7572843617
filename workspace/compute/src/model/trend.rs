//! Piecewise linear trend in scaled time.

/// Trend parameters: `k·t + m + Σ δⱼ (t - sⱼ)⁺`.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseLinear {
    /// Base growth rate
    pub k: f64,
    /// Offset
    pub m: f64,
    /// Rate adjustments, one per changepoint
    pub deltas: Vec<f64>,
    /// Changepoint locations in scaled time, ascending
    pub changepoints: Vec<f64>,
}

impl PiecewiseLinear {
    pub fn value(&self, t: f64) -> f64 {
        let adjustment: f64 = self
            .changepoints
            .iter()
            .zip(&self.deltas)
            .map(|(s, delta)| delta * hinge(t, *s))
            .sum();
        self.k * t + self.m + adjustment
    }

    /// Same trend with extra changepoints appended after the existing ones.
    pub fn extended(&self, changepoints: &[f64], deltas: &[f64]) -> Self {
        let mut extended = self.clone();
        extended.changepoints.extend_from_slice(changepoints);
        extended.deltas.extend_from_slice(deltas);
        extended
    }

    /// Mean absolute rate change, the scale of the rate changes expected in the future.
    pub fn mean_abs_delta(&self) -> f64 {
        if self.deltas.is_empty() {
            return 0.0;
        }
        self.deltas.iter().map(|d| d.abs()).sum::<f64>() / self.deltas.len() as f64
    }
}

/// `(t - s)⁺`
pub fn hinge(t: f64, s: f64) -> f64 {
    (t - s).max(0.0)
}

/// Row indices of the changepoints for `n` ordered observations.
///
/// Points are spread evenly over the first `range` share of the history. Short histories
/// get fewer changepoints, and none when there is no room for one.
pub fn changepoint_indices(n: usize, n_changepoints: usize, range: f64) -> Vec<usize> {
    let history = (n as f64 * range).floor() as usize;
    let count = if n_changepoints + 1 > history {
        history.saturating_sub(1)
    } else {
        n_changepoints
    };
    if count == 0 {
        return Vec::new();
    }

    // linspace(0, history - 1, count + 1), dropping the first point
    let last = (history - 1) as f64;
    (1..=count)
        .map(|i| (last * i as f64 / count as f64).round() as usize)
        .collect()
}
