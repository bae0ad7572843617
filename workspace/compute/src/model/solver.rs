use crate::error::{ComputeError, Result};

/// Dense row-major design matrix.
#[derive(Debug, Clone)]
pub struct Design {
    pub rows: usize,
    pub cols: usize,
    data: Vec<f64>,
}

impl Design {
    pub fn new(cols: usize) -> Self {
        Self {
            rows: 0,
            cols,
            data: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: &[f64]) {
        debug_assert_eq!(row.len(), self.cols);
        self.data.extend_from_slice(row);
        self.rows += 1;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn predict(&self, beta: &[f64]) -> Vec<f64> {
        (0..self.rows).map(|i| dot(self.row(i), beta)).collect()
    }
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Solves `(XᵀX + noise · diag(1 / prior_variance)) β = Xᵀy`.
///
/// This is the posterior mode of a linear model with independent zero-mean Gaussian priors
/// on the coefficients and Gaussian noise of the given variance.
pub fn ridge(x: &Design, y: &[f64], prior_variance: &[f64], noise_variance: f64) -> Result<Vec<f64>> {
    let p = x.cols;
    if y.len() != x.rows || prior_variance.len() != p {
        return Err(ComputeError::Solver(format!(
            "shape mismatch: {}x{} design, {} targets, {} priors",
            x.rows,
            p,
            y.len(),
            prior_variance.len()
        )));
    }

    let mut a = vec![0.0; p * p];
    let mut b = vec![0.0; p];
    for i in 0..x.rows {
        let row = x.row(i);
        for (j, xj) in row.iter().enumerate() {
            if *xj == 0.0 {
                continue;
            }
            b[j] += xj * y[i];
            for (l, xl) in row.iter().enumerate().skip(j) {
                a[j * p + l] += xj * xl;
            }
        }
    }
    for j in 0..p {
        for l in 0..j {
            a[j * p + l] = a[l * p + j];
        }
        a[j * p + j] += noise_variance / prior_variance[j];
    }

    let lower = cholesky(&a, p)?;
    let beta = cholesky_solve(&lower, p, &b);

    if beta.iter().any(|v| !v.is_finite()) {
        return Err(ComputeError::Solver("solution is not finite".to_string()));
    }
    Ok(beta)
}

/// Lower triangular factor of a symmetric positive definite matrix.
fn cholesky(a: &[f64], n: usize) -> Result<Vec<f64>> {
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[i * n + k] * l[j * n + k]).sum();
            if i == j {
                let diagonal = a[i * n + i] - sum;
                if diagonal <= 0.0 || !diagonal.is_finite() {
                    return Err(ComputeError::Solver(format!(
                        "matrix is not positive definite at column {}",
                        i
                    )));
                }
                l[i * n + i] = diagonal.sqrt();
            } else {
                l[i * n + j] = (a[i * n + j] - sum) / l[j * n + j];
            }
        }
    }
    Ok(l)
}

fn cholesky_solve(l: &[f64], n: usize, b: &[f64]) -> Vec<f64> {
    // L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|k| l[i * n + k] * z[k]).sum();
        z[i] = (b[i] - sum) / l[i * n + i];
    }
    // Lᵀ x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|k| l[k * n + i] * x[k]).sum();
        x[i] = (z[i] - sum) / l[i * n + i];
    }
    x
}
