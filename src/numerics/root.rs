// SPDX-License-Identifier: AGPL-3.0-only

//! Scalar root finding: Brent bracketing and damped Newton.

use crate::error::CosmoError;

const MAX_ITER: usize = 100;

/// Brent's method on a bracketing interval `[lo, hi]`.
///
/// Converges when the bracket width falls below `eps_rel * |root|`
/// (relative interval test, same convention as the classic
/// `root_test_interval`).
///
/// # Errors
///
/// `CosmoError::Root` if `f(lo)` and `f(hi)` do not bracket a sign
/// change, or the iteration budget is exhausted.
pub fn brent<F: Fn(f64) -> f64>(f: &F, lo: f64, hi: f64, eps_rel: f64) -> Result<f64, CosmoError> {
    let mut a = lo;
    let mut b = hi;
    let mut fa = f(a);
    let mut fb = f(b);
    if fa * fb > 0.0 {
        return Err(CosmoError::Root(format!(
            "Brent: no sign change on [{lo:.6e}, {hi:.6e}] (f = {fa:.3e}, {fb:.3e})"
        )));
    }
    let mut c = a;
    let mut fc = fa;
    let mut d = b - a;
    let mut e = d;

    for _ in 0..MAX_ITER {
        if fb.abs() > fc.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * eps_rel * b.abs();
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol || fb == 0.0 {
            return Ok(b);
        }
        if e.abs() >= tol && fa.abs() > fb.abs() {
            // Inverse quadratic interpolation (secant when a == c).
            let s = fb / fa;
            let (mut p, mut q);
            if a == c {
                p = 2.0 * xm * s;
                q = 1.0 - s;
            } else {
                let qq = fa / fc;
                let r = fb / fc;
                p = s * (2.0 * xm * qq * (qq - r) - (b - a) * (r - 1.0));
                q = (qq - 1.0) * (r - 1.0) * (s - 1.0);
            }
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            if 2.0 * p < (3.0 * xm * q - (tol * q).abs()).min((e * q).abs()) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }
        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(xm) };
        fb = f(b);
        if (fb > 0.0) == (fc > 0.0) {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
    }
    Err(CosmoError::Root(format!(
        "Brent: no convergence after {MAX_ITER} iterations on [{lo:.6e}, {hi:.6e}]"
    )))
}

/// Newton iteration with an analytic derivative, clamped to `[lo, hi]`.
///
/// Converges on the absolute step test `|Δx| < eps_abs`.
///
/// # Errors
///
/// `CosmoError::Root` if the derivative vanishes or the iteration
/// budget is exhausted.
pub fn newton<F, G>(
    f: &F,
    df: &G,
    x0: f64,
    lo: f64,
    hi: f64,
    eps_abs: f64,
) -> Result<f64, CosmoError>
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    let mut x = x0;
    for _ in 0..MAX_ITER {
        let fx = f(x);
        let dfx = df(x);
        if dfx == 0.0 {
            return Err(CosmoError::Root(format!(
                "Newton: zero derivative at x = {x:.6e}"
            )));
        }
        let x_next = (x - fx / dfx).clamp(lo, hi);
        if (x_next - x).abs() < eps_abs {
            return Ok(x_next);
        }
        x = x_next;
    }
    Err(CosmoError::Root(format!(
        "Newton: no convergence after {MAX_ITER} iterations from x0 = {x0:.6e}"
    )))
}
