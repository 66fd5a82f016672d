//! Ordinary Least Squares (OLS) regression utilities.
//!
//! Provides simple linear regression with slope inference (the statistical
//! trend path), multiple regression via the normal equations, and
//! polynomial fitting on a centered abscissa.

use crate::error::{Result, UrbanError};
use crate::utils::stats::{mean, pearson_r, sum_sq_dev, t_test_p_value};

/// Simple linear regression of `y` on `x` with slope inference.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation between x and y.
    pub r_value: f64,
    /// Two-sided p-value of the t-test on the slope.
    pub p_value: f64,
    /// Standard error of the slope.
    pub std_err: f64,
    /// Residual standard error, sqrt(SSR / (n - 2)); falls back to
    /// `std_err` when n = 2.
    pub residual_std_err: f64,
    pub n: usize,
}

impl LinearRegression {
    pub fn r_squared(&self) -> f64 {
        self.r_value * self.r_value
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit `y = intercept + slope * x` by closed-form least squares.
///
/// Two points give an exact fit: the slope p-value is 0 unless the line is
/// flat, and both standard errors are 0.
pub fn linregress(x: &[f64], y: &[f64]) -> Result<LinearRegression> {
    if x.len() != y.len() {
        return Err(UrbanError::DimensionMismatch {
            expected: x.len(),
            got: y.len(),
        });
    }
    let n = x.len();
    if n < 2 {
        return Err(UrbanError::InsufficientData { needed: 2, got: n });
    }

    let mean_x = mean(x);
    let mean_y = mean(y);
    let ss_xx = sum_sq_dev(x);
    if ss_xx.abs() < 1e-12 {
        return Err(UrbanError::ComputationError(
            "regression abscissa has zero variance".into(),
        ));
    }
    let ss_xy: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();

    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;
    let r_value = pearson_r(x, y);

    let ss_res: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (yi - (intercept + slope * xi)).powi(2))
        .sum();

    let (std_err, p_value, residual_std_err) = if n > 2 {
        let dof = (n - 2) as f64;
        let rse = (ss_res / dof).sqrt();
        let std_err = rse / ss_xx.sqrt();
        let p_value = if std_err > 1e-12 {
            t_test_p_value(slope / std_err, dof).unwrap_or(1.0)
        } else if slope == 0.0 {
            1.0
        } else {
            0.0
        };
        (std_err, p_value, rse)
    } else {
        let p_value = if slope == 0.0 { 1.0 } else { 0.0 };
        (0.0, p_value, 0.0)
    };

    Ok(LinearRegression {
        slope,
        intercept,
        r_value,
        p_value,
        std_err,
        residual_std_err,
        n,
    })
}

/// OLS regression coefficients and intercept.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// Regression coefficients (one per regressor column).
    pub coefficients: Vec<f64>,
    /// Intercept term.
    pub intercept: f64,
}

/// Fit OLS regression: y = intercept + X @ coefficients
///
/// `columns` holds one vector per regressor. Uses Cholesky decomposition
/// to solve the normal equations.
pub fn ols_fit(y: &[f64], columns: &[Vec<f64>]) -> Result<OLSResult> {
    let n = y.len();

    if n == 0 {
        return Err(UrbanError::InsufficientData { needed: 1, got: 0 });
    }

    if columns.is_empty() {
        return Ok(OLSResult {
            coefficients: vec![],
            intercept: mean(y),
        });
    }

    let k = columns.len();
    for col in columns {
        if col.len() != n {
            return Err(UrbanError::DimensionMismatch {
                expected: n,
                got: col.len(),
            });
        }
    }
    if n < k + 1 {
        return Err(UrbanError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }

    // Design matrix has k+1 columns: [1, x1, x2, ...]
    let num_params = k + 1;
    let mut xtx = vec![vec![0.0; num_params]; num_params];
    let mut xty = vec![0.0; num_params];

    for obs in 0..n {
        let y_obs = y[obs];

        xtx[0][0] += 1.0;
        for j in 0..k {
            let xj = columns[j][obs];
            xtx[0][j + 1] += xj;
            xtx[j + 1][0] += xj;
        }
        for i in 0..k {
            let xi = columns[i][obs];
            for j in 0..k {
                xtx[i + 1][j + 1] += xi * columns[j][obs];
            }
        }

        xty[0] += y_obs;
        for i in 0..k {
            xty[i + 1] += columns[i][obs] * y_obs;
        }
    }

    // Small ridge on the diagonal for numerical stability
    for i in 0..num_params {
        xtx[i][i] += 1e-8;
    }

    let beta = solve_symmetric(&xtx, &xty).ok_or_else(|| {
        UrbanError::ComputationError("OLS regression failed: matrix not positive definite".into())
    })?;

    Ok(OLSResult {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
    })
}

/// Solve symmetric positive definite system using Cholesky decomposition.
///
/// Solves A @ x = b where A is symmetric positive definite.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // Cholesky decomposition A = L @ L'
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // Forward substitution: L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}

/// Polynomial in a centered abscissa: y = c0 + c1*(x-m) + c2*(x-m)^2 + ...
///
/// Centering keeps the normal equations well conditioned for calendar years.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    pub degree: usize,
    pub center: f64,
    /// Coefficients c0..=c_degree.
    pub coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn eval(&self, x: f64) -> f64 {
        let t = x - self.center;
        // Horner
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * t + c)
    }
}

/// Least-squares polynomial fit of the given degree.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Result<Polynomial> {
    if x.len() != y.len() {
        return Err(UrbanError::DimensionMismatch {
            expected: x.len(),
            got: y.len(),
        });
    }
    if degree == 0 {
        return Err(UrbanError::InvalidParameter(
            "polynomial degree must be at least 1".into(),
        ));
    }
    if x.len() <= degree {
        return Err(UrbanError::InsufficientData {
            needed: degree + 1,
            got: x.len(),
        });
    }

    let center = mean(x);
    let columns: Vec<Vec<f64>> = (1..=degree)
        .map(|p| x.iter().map(|xi| (xi - center).powi(p as i32)).collect())
        .collect();

    let fit = ols_fit(y, &columns)?;
    let mut coefficients = Vec::with_capacity(degree + 1);
    coefficients.push(fit.intercept);
    coefficients.extend(fit.coefficients);

    Ok(Polynomial {
        degree,
        center,
        coefficients,
    })
}
