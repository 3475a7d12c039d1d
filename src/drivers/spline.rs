use ndarray::{Array1, ArrayView1};
use crate::drivers::error::VoltageDataError;
/// Polynomial degree of every fitted curve.
pub const SPLINE_DEGREE: usize = 3;
/// Fewest samples a degree-3 fit accepts.
pub const MIN_SPLINE_POINTS: usize = SPLINE_DEGREE + 1;
/// How the curve relates to the samples it is fitted through.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SplineFit {
    /// Passes through every sample, not-a-knot end conditions. Errors are ignored.
    #[default]
    Interpolating,
    /// Natural cubic spline minimising `sum(w * (y - g)^2) + penalty * int(g''^2)`
    /// with `w = 1 / sigma^2`.
    Smoothing { penalty: f64 },
}
/// Piecewise cubic stored as one polynomial per knot interval.
#[derive(Clone, Debug)]
pub struct CubicSpline {
    knots: Vec<f64>,
    coeffs: Vec<[f64; 4]>, // interval -> [value, slope, quadratic, cubic] around the left knot
}
impl CubicSpline {
    pub fn fit(
        times: ArrayView1<f64>,
        values: ArrayView1<f64>,
        errors: Option<ArrayView1<f64>>,
        fit: SplineFit,
    ) -> Result<Self, VoltageDataError> {
        let x = times.to_vec();
        let y = values.to_vec();
        if x.len() != y.len() {
            return Err(VoltageDataError::LengthMismatch {
                field: "values",
                expected: x.len(),
                actual: y.len(),
            });
        }
        if x.len() < MIN_SPLINE_POINTS {
            return Err(VoltageDataError::Spline(format!(
                "need at least {MIN_SPLINE_POINTS} samples, got {}",
                x.len()
            )));
        }
        if x.iter().chain(&y).any(|v| !v.is_finite()) {
            return Err(VoltageDataError::Spline("samples must be finite".into()));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(VoltageDataError::Spline(
                "times must be strictly increasing".into(),
            ));
        }
        let coeffs = match fit {
            SplineFit::Interpolating => not_a_knot(&x, &y)?,
            SplineFit::Smoothing { penalty } => {
                if !penalty.is_finite() || penalty < 0.0 {
                    return Err(VoltageDataError::Spline(format!(
                        "smoothing penalty must be finite and non-negative, got {penalty}"
                    )));
                }
                let variances = match errors {
                    Some(errors) => {
                        if errors.len() != x.len() {
                            return Err(VoltageDataError::LengthMismatch {
                                field: "errors",
                                expected: x.len(),
                                actual: errors.len(),
                            });
                        }
                        if errors.iter().any(|e| !e.is_finite() || *e <= 0.0) {
                            return Err(VoltageDataError::Spline(
                                "errors must be positive to be used as weights".into(),
                            ));
                        }
                        errors.iter().map(|e| e * e).collect()
                    }
                    None => vec![1.0; x.len()],
                };
                smoothing(&x, &y, &variances, penalty)?
            }
        };
        log::debug!("fitted {:?} spline through {} samples", fit, x.len());
        Ok(Self { knots: x, coeffs })
    }
    pub fn evaluate(&self, t: f64) -> f64 {
        let interval = self.interval(t);
        let [a, b, c, d] = self.coeffs[interval];
        let dt = t - self.knots[interval];
        a + dt * (b + dt * (c + dt * d))
    }
    pub fn evaluate_many(&self, times: ArrayView1<f64>) -> Array1<f64> {
        times.mapv(|t| self.evaluate(t))
    }
    /// First and last knot; evaluation outside this range extrapolates.
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }
    fn interval(&self, t: f64) -> usize {
        self.knots
            .partition_point(|&k| k <= t)
            .saturating_sub(1)
            .min(self.coeffs.len() - 1)
    }
}
fn not_a_knot(x: &[f64], y: &[f64]) -> Result<Vec<[f64; 4]>, VoltageDataError> {
    let n = x.len();
    let dx: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let slope: Vec<f64> = y
        .windows(2)
        .zip(&dx)
        .map(|(w, h)| (w[1] - w[0]) / h)
        .collect();
    // Unknowns are the first derivatives at every knot.
    let mut lower = vec![0.0; n - 1];
    let mut diag = vec![0.0; n];
    let mut upper = vec![0.0; n - 1];
    let mut rhs = vec![0.0; n];
    for i in 1..n - 1 {
        lower[i - 1] = dx[i];
        diag[i] = 2.0 * (dx[i - 1] + dx[i]);
        upper[i] = dx[i - 1];
        rhs[i] = 3.0 * (dx[i] * slope[i - 1] + dx[i - 1] * slope[i]);
    }
    // Third derivative continuous across the second and second-to-last knots.
    let span = x[2] - x[0];
    diag[0] = dx[1];
    upper[0] = span;
    rhs[0] = ((dx[0] + 2.0 * span) * dx[1] * slope[0] + dx[0] * dx[0] * slope[1]) / span;
    let span = x[n - 1] - x[n - 3];
    diag[n - 1] = dx[n - 3];
    lower[n - 2] = span;
    rhs[n - 1] = (dx[n - 2] * dx[n - 2] * slope[n - 3]
        + (2.0 * span + dx[n - 2]) * dx[n - 3] * slope[n - 2])
        / span;
    let derivs = solve_tridiagonal(lower, diag, upper, rhs)?;
    Ok((0..n - 1)
        .map(|i| {
            let h = dx[i];
            let (s0, s1) = (derivs[i], derivs[i + 1]);
            [
                y[i],
                s0,
                (3.0 * slope[i] - 2.0 * s0 - s1) / h,
                (s0 + s1 - 2.0 * slope[i]) / (h * h),
            ]
        })
        .collect())
}
/// Reinsch smoothing spline. `variances` are `1 / w`.
fn smoothing(
    x: &[f64],
    y: &[f64],
    variances: &[f64],
    penalty: f64,
) -> Result<Vec<[f64; 4]>, VoltageDataError> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    // Column j of Q (interior knots 1..n-1) has entries in rows j-1, j, j+1.
    let up = |j: usize| 1.0 / h[j - 1];
    let mid = |j: usize| -1.0 / h[j - 1] - 1.0 / h[j];
    let low = |j: usize| 1.0 / h[j];
    let m = n - 2;
    let mut diag = vec![0.0; m];
    let mut off1 = vec![0.0; m - 1];
    let mut off2 = vec![0.0; m.saturating_sub(2)];
    let mut rhs = vec![0.0; m];
    for k in 0..m {
        let j = k + 1;
        diag[k] = (h[j - 1] + h[j]) / 3.0
            + penalty
                * (up(j).powi(2) * variances[j - 1]
                    + mid(j).powi(2) * variances[j]
                    + low(j).powi(2) * variances[j + 1]);
        if k + 1 < m {
            off1[k] = h[j] / 6.0
                + penalty
                    * (mid(j) * up(j + 1) * variances[j] + low(j) * mid(j + 1) * variances[j + 1]);
        }
        if k + 2 < m {
            off2[k] = penalty * low(j) * up(j + 2) * variances[j + 1];
        }
        rhs[k] = up(j) * y[j - 1] + mid(j) * y[j] + low(j) * y[j + 1];
    }
    let gamma = solve_pentadiagonal_spd(&diag, &off1, &off2, rhs)?;
    let mut second = vec![0.0; n];
    second[1..n - 1].copy_from_slice(&gamma);
    let fitted: Vec<f64> = (0..n)
        .map(|i| {
            let mut q_gamma = 0.0;
            if i + 1 < n - 1 {
                q_gamma += up(i + 1) * second[i + 1];
            }
            if i >= 1 && i < n - 1 {
                q_gamma += mid(i) * second[i];
            }
            if i >= 2 {
                q_gamma += low(i - 1) * second[i - 1];
            }
            y[i] - penalty * variances[i] * q_gamma
        })
        .collect();
    Ok((0..n - 1)
        .map(|i| {
            let step = h[i];
            [
                fitted[i],
                (fitted[i + 1] - fitted[i]) / step
                    - step * (2.0 * second[i] + second[i + 1]) / 6.0,
                second[i] / 2.0,
                (second[i + 1] - second[i]) / (6.0 * step),
            ]
        })
        .collect())
}
/// Gaussian elimination with partial pivoting on a tridiagonal system.
/// `lower[i]` is `a[i+1][i]`, `upper[i]` is `a[i][i+1]`.
fn solve_tridiagonal(
    lower: Vec<f64>,
    mut diag: Vec<f64>,
    mut upper: Vec<f64>,
    mut rhs: Vec<f64>,
) -> Result<Vec<f64>, VoltageDataError> {
    let n = diag.len();
    let singular = || VoltageDataError::Spline("singular spline system".into());
    // Fill-in on the second superdiagonal after row swaps.
    let mut upper2 = vec![0.0; n.saturating_sub(2)];
    for i in 0..n - 1 {
        if diag[i].abs() >= lower[i].abs() {
            if diag[i] == 0.0 {
                return Err(singular());
            }
            let fact = lower[i] / diag[i];
            diag[i + 1] -= fact * upper[i];
            rhs[i + 1] -= fact * rhs[i];
        } else {
            let fact = diag[i] / lower[i];
            diag[i] = lower[i];
            let temp = diag[i + 1];
            diag[i + 1] = upper[i] - fact * temp;
            if i + 2 < n {
                upper2[i] = upper[i + 1];
                upper[i + 1] = -fact * upper2[i];
            }
            upper[i] = temp;
            let temp = rhs[i];
            rhs[i] = rhs[i + 1];
            rhs[i + 1] = temp - fact * rhs[i + 1];
        }
    }
    if diag[n - 1] == 0.0 {
        return Err(singular());
    }
    rhs[n - 1] /= diag[n - 1];
    if n > 1 {
        rhs[n - 2] = (rhs[n - 2] - upper[n - 2] * rhs[n - 1]) / diag[n - 2];
    }
    for i in (0..n.saturating_sub(2)).rev() {
        rhs[i] = (rhs[i] - upper[i] * rhs[i + 1] - upper2[i] * rhs[i + 2]) / diag[i];
    }
    Ok(rhs)
}
/// Banded Cholesky for a symmetric positive definite system with two off-diagonals.
fn solve_pentadiagonal_spd(
    diag: &[f64],
    off1: &[f64],
    off2: &[f64],
    mut rhs: Vec<f64>,
) -> Result<Vec<f64>, VoltageDataError> {
    let m = diag.len();
    // l0[i] = L[i][i], l1[i] = L[i+1][i], l2[i] = L[i+2][i]
    let mut l0 = vec![0.0; m];
    let mut l1 = vec![0.0; m.saturating_sub(1)];
    let mut l2 = vec![0.0; m.saturating_sub(2)];
    for j in 0..m {
        let mut pivot = diag[j];
        if j >= 1 {
            pivot -= l1[j - 1] * l1[j - 1];
        }
        if j >= 2 {
            pivot -= l2[j - 2] * l2[j - 2];
        }
        if !(pivot > 0.0) || !pivot.is_finite() {
            return Err(VoltageDataError::Spline(
                "smoothing system is not positive definite".into(),
            ));
        }
        l0[j] = pivot.sqrt();
        if j + 1 < m {
            let mut a = off1[j];
            if j >= 1 {
                a -= l2[j - 1] * l1[j - 1];
            }
            l1[j] = a / l0[j];
        }
        if j + 2 < m {
            l2[j] = off2[j] / l0[j];
        }
    }
    for i in 0..m {
        if i >= 1 {
            rhs[i] -= l1[i - 1] * rhs[i - 1];
        }
        if i >= 2 {
            rhs[i] -= l2[i - 2] * rhs[i - 2];
        }
        rhs[i] /= l0[i];
    }
    for i in (0..m).rev() {
        if i + 1 < m {
            rhs[i] -= l1[i] * rhs[i + 1];
        }
        if i + 2 < m {
            rhs[i] -= l2[i] * rhs[i + 2];
        }
        rhs[i] /= l0[i];
    }
    Ok(rhs)
}
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array1};
    fn fit(x: &[f64], y: &[f64], fit: SplineFit) -> CubicSpline {
        CubicSpline::fit(arr1(x).view(), arr1(y).view(), None, fit).unwrap()
    }
    #[test]
    fn interpolating_spline_hits_every_sample() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 0.0, 1.0];
        let spline = fit(&x, &y, SplineFit::Interpolating);
        for (t, v) in x.iter().zip(&y) {
            assert!((spline.evaluate(*t) - v).abs() < 1e-9);
        }
    }
    #[test]
    fn not_a_knot_reproduces_cubics_including_extrapolation() {
        let cubic = |t: f64| t * t * t - 2.0 * t * t + 0.5 * t + 1.0;
        let x = [0.0, 0.5, 1.7, 2.0, 3.1, 4.0, 6.0];
        let y: Vec<f64> = x.iter().map(|&t| cubic(t)).collect();
        let spline = fit(&x, &y, SplineFit::Interpolating);
        for t in [0.25, 1.0, 2.5, 5.5, -1.0, 7.0] {
            assert!((spline.evaluate(t) - cubic(t)).abs() < 1e-8, "t = {t}");
        }
    }
    #[test]
    fn evaluate_many_matches_scalar_evaluation() {
        let spline = fit(
            &[0.0, 1.0, 2.0, 3.0, 4.0],
            &[1.0, 3.0, 2.0, 5.0, 4.0],
            SplineFit::Interpolating,
        );
        let grid = Array1::linspace(-0.5, 4.5, 11);
        let values = spline.evaluate_many(grid.view());
        for (t, v) in grid.iter().zip(values.iter()) {
            assert_eq!(spline.evaluate(*t), *v);
        }
        assert_eq!(spline.domain(), (0.0, 4.0));
    }
    #[test]
    fn rejects_short_or_unsorted_input() {
        let short = CubicSpline::fit(
            arr1(&[0.0, 1.0, 2.0]).view(),
            arr1(&[0.0, 1.0, 0.0]).view(),
            None,
            SplineFit::Interpolating,
        );
        assert!(matches!(short, Err(VoltageDataError::Spline(_))));
        let unsorted = CubicSpline::fit(
            arr1(&[0.0, 2.0, 1.0, 3.0]).view(),
            arr1(&[0.0, 1.0, 0.0, 1.0]).view(),
            None,
            SplineFit::Interpolating,
        );
        assert!(matches!(unsorted, Err(VoltageDataError::Spline(_))));
    }
    #[test]
    fn zero_penalty_smoothing_interpolates() {
        let x = [0.0, 1.0, 2.5, 3.0, 4.0];
        let y = [2.0, -1.0, 0.5, 3.0, 1.0];
        let spline = fit(&x, &y, SplineFit::Smoothing { penalty: 0.0 });
        for (t, v) in x.iter().zip(&y) {
            assert!((spline.evaluate(*t) - v).abs() < 1e-9);
        }
    }
    #[test]
    fn smoothing_leaves_straight_lines_alone() {
        let x: Vec<f64> = (0..8).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|t| 2.0 * t + 1.0).collect();
        let spline = fit(&x, &y, SplineFit::Smoothing { penalty: 10.0 });
        assert!((spline.evaluate(4.5) - 10.0).abs() < 1e-9);
    }
    #[test]
    fn huge_penalty_tends_to_weighted_least_squares_line() {
        let x = [0.0, 0.4, 1.5, 2.0, 3.3, 4.1, 6.0];
        let y = [1.1, 1.9, 3.8, 5.3, 7.2, 9.5, 12.4];
        let sigma = [0.2, 1.5, 0.5, 0.9, 0.3, 1.2, 0.7];
        let spline = CubicSpline::fit(
            arr1(&x).view(),
            arr1(&y).view(),
            Some(arr1(&sigma).view()),
            SplineFit::Smoothing { penalty: 1e8 },
        )
        .unwrap();
        let (mut sw, mut swx, mut swy, mut swxx, mut swxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for ((&t, &v), &s) in x.iter().zip(&y).zip(&sigma) {
            let w = 1.0 / (s * s);
            sw += w;
            swx += w * t;
            swy += w * v;
            swxx += w * t * t;
            swxy += w * t * v;
        }
        let slope = (sw * swxy - swx * swy) / (sw * swxx - swx * swx);
        let intercept = (swy - slope * swx) / sw;
        for t in [0.0, 0.4, 1.0, 2.7, 4.1, 5.5, 6.0] {
            let line = intercept + slope * t;
            assert!((spline.evaluate(t) - line).abs() < 1e-5, "t = {t}");
        }
    }
    #[test]
    fn smaller_errors_pull_the_curve_closer() {
        let x: Vec<f64> = (0..8).map(f64::from).collect();
        let mut y = vec![0.0; 8];
        y[3] = 1.0;
        let fit_with = |errors: Vec<f64>| {
            CubicSpline::fit(
                arr1(&x).view(),
                arr1(&y).view(),
                Some(arr1(&errors).view()),
                SplineFit::Smoothing { penalty: 1.0 },
            )
            .unwrap()
        };
        let uniform = fit_with(vec![1.0; 8]);
        let mut errors = vec![1.0; 8];
        errors[3] = 0.01;
        let pinned = fit_with(errors);
        let residual = |s: &CubicSpline| (s.evaluate(3.0) - 1.0).abs();
        assert!(residual(&pinned) < residual(&uniform));
        assert!(residual(&pinned) < 0.05);
    }
    #[test]
    fn smoothing_rejects_non_positive_errors() {
        let result = CubicSpline::fit(
            arr1(&[0.0, 1.0, 2.0, 3.0]).view(),
            arr1(&[0.0, 1.0, 0.0, 1.0]).view(),
            Some(arr1(&[0.1, 0.0, 0.1, 0.1]).view()),
            SplineFit::Smoothing { penalty: 1.0 },
        );
        assert!(matches!(result, Err(VoltageDataError::Spline(_))));
    }
}
