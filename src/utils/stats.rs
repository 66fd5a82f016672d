//! Statistical utility functions.

use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sum of squared deviations from the mean.
pub fn sum_sq_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum()
}

/// Pearson correlation coefficient. Returns 0 when either side is constant.
pub fn pearson_r(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let mx = mean(x);
    let my = mean(y);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        sxy += (xi - mx) * (yi - my);
        sxx += (xi - mx).powi(2);
        syy += (yi - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return 0.0;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Two-sided critical value of Student's t for a confidence `level`
/// (e.g. 0.95) with `dof` degrees of freedom.
pub fn t_critical(level: f64, dof: f64) -> Option<f64> {
    if dof <= 0.0 || !(0.0..1.0).contains(&level) {
        return None;
    }
    let dist = StudentsT::new(0.0, 1.0, dof).ok()?;
    Some(dist.inverse_cdf(0.5 + level / 2.0))
}

/// Two-sided p-value for a t statistic with `dof` degrees of freedom.
pub fn t_test_p_value(t_stat: f64, dof: f64) -> Option<f64> {
    if dof <= 0.0 || t_stat.is_nan() {
        return None;
    }
    if t_stat.is_infinite() {
        return Some(0.0);
    }
    let dist = StudentsT::new(0.0, 1.0, dof).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t_stat.abs()))).clamp(0.0, 1.0))
}

/// Upper-tail p-value of an F statistic with (`d1`, `d2`) degrees of freedom.
pub fn f_test_p_value(f_stat: f64, d1: f64, d2: f64) -> Option<f64> {
    if d1 <= 0.0 || d2 <= 0.0 || f_stat.is_nan() {
        return None;
    }
    if f_stat.is_infinite() {
        return Some(0.0);
    }
    if f_stat <= 0.0 {
        return Some(1.0);
    }
    let dist = FisherSnedecor::new(d1, d2).ok()?;
    Some((1.0 - dist.cdf(f_stat)).clamp(0.0, 1.0))
}

/// Centered rolling mean with window `window`; edges use the available
/// neighbours (pandas `rolling(window, center=True, min_periods=1)`).
pub fn centered_rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return values.to_vec();
    }
    let n = values.len();
    let before = (window - 1) / 2;
    let after = window - 1 - before;
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(before);
            let end = (i + after + 1).min(n);
            mean(&values[start..end])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_calculates_correctly() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert_relative_eq!(mean(&[10.0]), 10.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn sum_sq_dev_matches_definition() {
        assert_relative_eq!(sum_sq_dev(&[2018.0, 2019.0, 2020.0, 2021.0, 2022.0]), 10.0);
    }

    #[test]
    fn pearson_r_detects_linear_relationships() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(pearson_r(&x, &[2.0, 4.0, 6.0, 8.0]), 1.0, epsilon = 1e-12);
        assert_relative_eq!(pearson_r(&x, &[8.0, 6.0, 4.0, 2.0]), -1.0, epsilon = 1e-12);
        assert_eq!(pearson_r(&x, &[3.0, 3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn t_critical_known_values() {
        // t(0.975, 3) = 3.182, t(0.975, 30) = 2.042
        assert_relative_eq!(t_critical(0.95, 3.0).unwrap(), 3.182, epsilon = 1e-3);
        assert_relative_eq!(t_critical(0.95, 30.0).unwrap(), 2.042, epsilon = 1e-3);
        assert!(t_critical(0.95, 0.0).is_none());
    }

    #[test]
    fn t_test_p_value_is_two_sided() {
        // |t| = 3.182 with 3 dof is exactly the 5% two-sided cut-off
        assert_relative_eq!(t_test_p_value(3.182, 3.0).unwrap(), 0.05, epsilon = 1e-3);
        assert_relative_eq!(t_test_p_value(-3.182, 3.0).unwrap(), 0.05, epsilon = 1e-3);
        assert_relative_eq!(t_test_p_value(0.0, 3.0).unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(t_test_p_value(f64::INFINITY, 3.0), Some(0.0));
    }

    #[test]
    fn f_test_matches_squared_t_test() {
        // With one numerator dof, F = t^2 gives the same p-value
        let p_t = t_test_p_value(2.5, 8.0).unwrap();
        let p_f = f_test_p_value(6.25, 1.0, 8.0).unwrap();
        assert_relative_eq!(p_t, p_f, epsilon = 1e-9);
        assert_eq!(f_test_p_value(0.0, 2.0, 5.0), Some(1.0));
        assert!(f_test_p_value(1.0, 0.0, 5.0).is_none());
    }

    #[test]
    fn centered_rolling_mean_uses_partial_edges() {
        let smoothed = centered_rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(smoothed, vec![1.5, 2.0, 3.0, 4.0, 4.5]);
        assert_eq!(centered_rolling_mean(&[1.0, 5.0], 1), vec![1.0, 5.0]);
    }
}
