// SPDX-License-Identifier: AGPL-3.0-only

//! Adaptive Simpson quadrature.
//!
//! Doubly-adaptive bisection with Richardson extrapolation of the
//! Simpson estimate. Each subinterval terminates on a relative test
//! against its own refined value, floored by a tiny absolute budget,
//! so the accumulated error is bounded by `eps_rel` times the integral
//! of |f|. A minimum subdivision depth keeps narrow features from
//! being missed by the coarse top-level estimate (the phase-space and
//! Fermi-Dirac integrands peak in a tiny fraction of their domain).

use crate::error::CosmoError;

/// Forced initial bisection: 2^6 panels resolve any feature wider
/// than a sixtieth of the domain.
const MIN_DEPTH: u32 = 6;
const MAX_DEPTH: u32 = 50;

/// Absolute escape hatch for the termination test. Where the integrand
/// underflows to subnormals or exact zero, `left + right` can round to
/// 0 while `delta` does not, and a purely relative test would recurse
/// forever; any interval contributing below this floor is noise.
const ABS_FLOOR: f64 = 1e-300;

fn simpson(fa: f64, fm: f64, fb: f64, h: f64) -> f64 {
    h / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn adapt<F: Fn(f64) -> f64>(
    f: &F,
    a: f64,
    fa: f64,
    b: f64,
    fb: f64,
    fm: f64,
    whole: f64,
    eps_rel: f64,
    level: u32,
) -> Result<f64, CosmoError> {
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = f(lm);
    let frm = f(rm);

    let left = simpson(fa, flm, fm, m - a);
    let right = simpson(fm, frm, fb, b - m);
    let delta = left + right - whole;

    // Factor 15 from the Richardson error estimate of Simpson halving.
    let budget = (eps_rel * (left + right).abs()).max(ABS_FLOOR);
    if level >= MIN_DEPTH && delta.abs() <= 15.0 * budget {
        return Ok(left + right + delta / 15.0);
    }
    if level >= MAX_DEPTH {
        return Err(CosmoError::Integration(format!(
            "adaptive Simpson: no convergence on [{a:.6e}, {b:.6e}]"
        )));
    }

    let l = adapt(f, a, fa, m, fm, flm, left, eps_rel, level + 1)?;
    let r = adapt(f, m, fm, b, fb, frm, right, eps_rel, level + 1)?;
    Ok(l + r)
}

/// Integrate `f` over `[a, b]` to relative tolerance `eps_rel`.
///
/// # Errors
///
/// `CosmoError::Integration` if the recursion depth is exhausted before
/// the tolerance is met.
pub fn integrate<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, eps_rel: f64) -> Result<f64, CosmoError> {
    if a == b {
        return Ok(0.0);
    }
    let fa = f(a);
    let fb = f(b);
    let m = 0.5 * (a + b);
    let fm = f(m);
    let whole = simpson(fa, fm, fb, b - a);
    adapt(f, a, fa, b, fb, fm, whole, eps_rel, 0)
}
