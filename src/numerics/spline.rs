// SPDX-License-Identifier: AGPL-3.0-only

//! Natural cubic splines with a stateful lookup accelerator.
//!
//! A [`Spline`] is immutable after construction; the [`Accel`] is a
//! per-caller cursor caching the last bracketing interval, so repeated
//! nearby evaluations skip the binary search. Accelerators must not be
//! shared across concurrent evaluations.

use crate::error::CosmoError;

/// Stateful interpolation cursor. One per evaluation stream.
#[derive(Debug, Clone, Default)]
pub struct Accel {
    cursor: usize,
}

impl Accel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Natural cubic spline over strictly increasing abscissae.
///
/// Evaluation outside the sampled domain clamps to the endpoint values
/// (documented policy: callers range-check before evaluating when
/// out-of-domain must be an error).
#[derive(Debug, Clone)]
pub struct Spline {
    x: Vec<f64>,
    y: Vec<f64>,
    y2: Vec<f64>,
}

impl Spline {
    /// Build a spline from samples. Copies both arrays.
    ///
    /// # Errors
    ///
    /// `CosmoError::Spline` if fewer than 3 samples, mismatched lengths,
    /// non-finite values, or non-increasing abscissae.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, CosmoError> {
        if x.len() != y.len() {
            return Err(CosmoError::Spline(format!(
                "length mismatch: {} abscissae, {} ordinates",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 3 {
            return Err(CosmoError::Spline(format!(
                "need at least 3 samples, got {}",
                x.len()
            )));
        }
        for w in x.windows(2) {
            if !(w[1] > w[0]) {
                return Err(CosmoError::Spline(format!(
                    "abscissae not strictly increasing near x = {:.6e}",
                    w[0]
                )));
            }
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(CosmoError::Spline("non-finite sample".into()));
        }

        let y2 = second_derivatives(x, y);
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            y2,
        })
    }

    /// Domain of the sampled abscissae `(min, max)`.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Evaluate without an accelerator (fresh binary search).
    #[must_use]
    pub fn eval(&self, xv: f64) -> f64 {
        let xv = xv.clamp(self.x[0], self.x[self.x.len() - 1]);
        let i = self.locate(xv, None);
        self.eval_interval(i, xv)
    }

    /// Evaluate with a lookup accelerator (cursor updated in place).
    #[must_use]
    pub fn eval_accel(&self, xv: f64, acc: &mut Accel) -> f64 {
        let xv = xv.clamp(self.x[0], self.x[self.x.len() - 1]);
        let i = self.locate(xv, Some(acc.cursor));
        acc.cursor = i;
        self.eval_interval(i, xv)
    }

    /// Index `i` with `x[i] <= xv < x[i+1]`, clamped to valid intervals.
    fn locate(&self, xv: f64, hint: Option<usize>) -> usize {
        let n = self.x.len();
        if let Some(h) = hint {
            if h + 1 < n && self.x[h] <= xv && xv < self.x[h + 1] {
                return h;
            }
        }
        if xv <= self.x[0] {
            return 0;
        }
        if xv >= self.x[n - 1] {
            return n - 2;
        }
        // partition_point: first index with x[i] > xv, minus one
        self.x.partition_point(|&v| v <= xv) - 1
    }

    fn eval_interval(&self, i: usize, xv: f64) -> f64 {
        let (x0, x1) = (self.x[i], self.x[i + 1]);
        let h = x1 - x0;
        let a = (x1 - xv) / h;
        let b = (xv - x0) / h;
        a * self.y[i]
            + b * self.y[i + 1]
            + ((a * a * a - a) * self.y2[i] + (b * b * b - b) * self.y2[i + 1]) * h * h / 6.0
    }
}

/// Tridiagonal solve for the natural-spline second derivatives.
fn second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut y2 = vec![0.0; n];
    let mut u = vec![0.0; n - 1];
    for i in 1..n - 1 {
        let sig = (x[i] - x[i - 1]) / (x[i + 1] - x[i - 1]);
        let p = sig * y2[i - 1] + 2.0;
        y2[i] = (sig - 1.0) / p;
        let d = (y[i + 1] - y[i]) / (x[i + 1] - x[i]) - (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
        u[i] = (6.0 * d / (x[i + 1] - x[i - 1]) - sig * u[i - 1]) / p;
    }
    for i in (0..n - 1).rev() {
        y2[i] = y2[i] * y2[i + 1] + u[i];
    }
    y2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| a + (b - a) * i as f64 / (n - 1) as f64)
            .collect()
    }

    #[test]
    fn reproduces_samples_exactly() {
        let x = linspace(0.0, 1.0, 11);
        let y: Vec<f64> = x.iter().map(|&v| v * v).collect();
        let sp = Spline::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert!((sp.eval(*xi) - yi).abs() < 1e-14);
        }
    }

    #[test]
    fn interpolates_smooth_function() {
        let x = linspace(0.0, std::f64::consts::PI, 100);
        let y: Vec<f64> = x.iter().map(|v| v.sin()).collect();
        let sp = Spline::new(&x, &y).unwrap();
        for i in 0..500 {
            let xv = std::f64::consts::PI * i as f64 / 499.0;
            assert!(
                (sp.eval(xv) - xv.sin()).abs() < 1e-7,
                "sin interpolation error at {xv}"
            );
        }
    }

    #[test]
    fn accel_matches_plain_eval() {
        let x = linspace(-2.0, 2.0, 50);
        let y: Vec<f64> = x.iter().map(|v| v.exp()).collect();
        let sp = Spline::new(&x, &y).unwrap();
        let mut acc = Accel::new();
        // Sweep forward then backward so the cursor both hits and misses.
        for i in (0..200).chain((0..200).rev()) {
            let xv = -2.0 + 4.0 * i as f64 / 199.0;
            assert_eq!(sp.eval(xv), sp.eval_accel(xv, &mut acc));
        }
    }

    #[test]
    fn clamps_outside_domain() {
        let x = linspace(0.0, 1.0, 10);
        let y: Vec<f64> = x.iter().map(|&v| 2.0 * v).collect();
        let sp = Spline::new(&x, &y).unwrap();
        assert!((sp.eval(-5.0) - 0.0).abs() < 1e-12);
        assert!((sp.eval(5.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Spline::new(&[0.0, 1.0], &[0.0, 1.0]).is_err(), "too few");
        assert!(
            Spline::new(&[0.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).is_err(),
            "not strictly increasing"
        );
        assert!(
            Spline::new(&[0.0, 1.0, 2.0], &[0.0, f64::NAN, 2.0]).is_err(),
            "non-finite"
        );
        assert!(
            Spline::new(&[0.0, 1.0, 2.0], &[0.0, 1.0]).is_err(),
            "length mismatch"
        );
    }

    #[test]
    fn domain_reports_endpoints() {
        let x = linspace(0.5, 4.5, 9);
        let y = vec![1.0; 9];
        let sp = Spline::new(&x, &y).unwrap();
        assert_eq!(sp.domain(), (0.5, 4.5));
    }
}
