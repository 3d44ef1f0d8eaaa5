// SPDX-License-Identifier: AGPL-3.0-only

//! Adaptive Cash–Karp Runge-Kutta (RK45) driver.
//!
//! Embedded 4th/5th-order pair with PI-free step control: grow by
//! err^(-1/5), shrink by err^(-1/4), safety factor 0.9. Matches the
//! classic RKCK stepper used for the growth ODE.

use crate::error::CosmoError;

// Cash-Karp tableau (Numerical Recipes 16.2)
const A2: f64 = 0.2;
const A3: f64 = 0.3;
const A4: f64 = 0.6;
const A5: f64 = 1.0;
const A6: f64 = 0.875;

const B21: f64 = 0.2;
const B31: f64 = 3.0 / 40.0;
const B32: f64 = 9.0 / 40.0;
const B41: f64 = 0.3;
const B42: f64 = -0.9;
const B43: f64 = 1.2;
const B51: f64 = -11.0 / 54.0;
const B52: f64 = 2.5;
const B53: f64 = -70.0 / 27.0;
const B54: f64 = 35.0 / 27.0;
const B61: f64 = 1631.0 / 55296.0;
const B62: f64 = 175.0 / 512.0;
const B63: f64 = 575.0 / 13824.0;
const B64: f64 = 44275.0 / 110592.0;
const B65: f64 = 253.0 / 4096.0;

const C1: f64 = 37.0 / 378.0;
const C3: f64 = 250.0 / 621.0;
const C4: f64 = 125.0 / 594.0;
const C6: f64 = 512.0 / 1771.0;

const DC1: f64 = C1 - 2825.0 / 27648.0;
const DC3: f64 = C3 - 18575.0 / 48384.0;
const DC4: f64 = C4 - 13525.0 / 55296.0;
const DC5: f64 = -277.0 / 14336.0;
const DC6: f64 = C6 - 0.25;

const SAFETY: f64 = 0.9;
const MAX_STEPS: usize = 1_000_000;
const TINY: f64 = 1e-30;

/// One Cash-Karp step from `t` with size `h`; fills `y_out` and the
/// per-component embedded error estimate `y_err`.
#[allow(clippy::too_many_arguments)]
fn rkck_step<F>(deriv: &F, t: f64, y: &[f64], dydt: &[f64], h: f64, y_out: &mut [f64], y_err: &mut [f64])
where
    F: Fn(f64, &[f64], &mut [f64]),
{
    let n = y.len();
    let mut k2 = vec![0.0; n];
    let mut k3 = vec![0.0; n];
    let mut k4 = vec![0.0; n];
    let mut k5 = vec![0.0; n];
    let mut k6 = vec![0.0; n];
    let mut tmp = vec![0.0; n];

    for i in 0..n {
        tmp[i] = y[i] + h * B21 * dydt[i];
    }
    deriv(t + A2 * h, &tmp, &mut k2);
    for i in 0..n {
        tmp[i] = y[i] + h * (B31 * dydt[i] + B32 * k2[i]);
    }
    deriv(t + A3 * h, &tmp, &mut k3);
    for i in 0..n {
        tmp[i] = y[i] + h * (B41 * dydt[i] + B42 * k2[i] + B43 * k3[i]);
    }
    deriv(t + A4 * h, &tmp, &mut k4);
    for i in 0..n {
        tmp[i] = y[i] + h * (B51 * dydt[i] + B52 * k2[i] + B53 * k3[i] + B54 * k4[i]);
    }
    deriv(t + A5 * h, &tmp, &mut k5);
    for i in 0..n {
        tmp[i] = y[i] + h * (B61 * dydt[i] + B62 * k2[i] + B63 * k3[i] + B64 * k4[i] + B65 * k5[i]);
    }
    deriv(t + A6 * h, &tmp, &mut k6);

    for i in 0..n {
        y_out[i] = y[i] + h * (C1 * dydt[i] + C3 * k3[i] + C4 * k4[i] + C6 * k6[i]);
        y_err[i] = h * (DC1 * dydt[i] + DC3 * k3[i] + DC4 * k4[i] + DC5 * k5[i] + DC6 * k6[i]);
    }
}

/// Drive the system `dy/dt = deriv(t, y)` from `t0` to `t1` in place.
///
/// `h_start` is the initial trial step; the controller adapts it to
/// keep the per-step relative error below `eps_rel`.
///
/// # Errors
///
/// `CosmoError::Integration` if the step size underflows or the step
/// budget is exhausted.
pub fn rk45_drive<F>(
    deriv: &F,
    t0: f64,
    t1: f64,
    y: &mut [f64],
    h_start: f64,
    eps_rel: f64,
) -> Result<(), CosmoError>
where
    F: Fn(f64, &[f64], &mut [f64]),
{
    if t0 == t1 {
        return Ok(());
    }
    let n = y.len();
    let dir = (t1 - t0).signum();
    let mut t = t0;
    let mut h = h_start.abs() * dir;
    let mut dydt = vec![0.0; n];
    let mut y_out = vec![0.0; n];
    let mut y_err = vec![0.0; n];

    for _ in 0..MAX_STEPS {
        if (t - t1) * dir >= 0.0 {
            return Ok(());
        }
        // Do not step past the endpoint.
        if (t + h - t1) * dir > 0.0 {
            h = t1 - t;
        }
        deriv(t, y, &mut dydt);
        rkck_step(deriv, t, y, &dydt, h, &mut y_out, &mut y_err);

        let mut err: f64 = 0.0;
        for i in 0..n {
            let scale = eps_rel * (y[i].abs() + (h * dydt[i]).abs()) + TINY;
            err = err.max((y_err[i] / scale).abs());
        }

        if err <= 1.0 {
            t += h;
            y.copy_from_slice(&y_out);
            let grow = if err > 1.89e-4 {
                SAFETY * err.powf(-0.2)
            } else {
                5.0 // cap growth at 5x
            };
            h *= grow.min(5.0);
        } else {
            let shrink = (SAFETY * err.powf(-0.25)).max(0.1);
            h *= shrink;
            if (t + h - t) == 0.0 {
                return Err(CosmoError::Integration(format!(
                    "RK45: step underflow at t = {t:.6e}"
                )));
            }
        }
    }
    Err(CosmoError::Integration(format!(
        "RK45: step budget exhausted between {t0:.3e} and {t1:.3e}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_growth() {
        // y' = y, y(0) = 1 → y(1) = e
        let mut y = [1.0];
        rk45_drive(&|_t, y: &[f64], dy: &mut [f64]| dy[0] = y[0], 0.0, 1.0, &mut y, 0.01, 1e-8)
            .unwrap();
        let rel = ((y[0] - std::f64::consts::E) / std::f64::consts::E).abs();
        assert!(rel < 1e-7, "y(1) = {}, rel_err = {rel:.2e}", y[0]);
    }

    #[test]
    fn harmonic_oscillator_period() {
        // y'' = -y as a first-order system; y(2π) should return to start.
        let deriv = |_t: f64, y: &[f64], dy: &mut [f64]| {
            dy[0] = y[1];
            dy[1] = -y[0];
        };
        let mut y = [1.0, 0.0];
        rk45_drive(&deriv, 0.0, 2.0 * std::f64::consts::PI, &mut y, 0.1, 1e-9).unwrap();
        assert!((y[0] - 1.0).abs() < 1e-6, "cos(2π) = {}", y[0]);
        assert!(y[1].abs() < 1e-6, "-sin(2π) = {}", y[1]);
    }

    #[test]
    fn zero_length_interval_is_identity() {
        let mut y = [3.5];
        rk45_drive(&|_t, _y: &[f64], dy: &mut [f64]| dy[0] = 1.0, 2.0, 2.0, &mut y, 0.1, 1e-6)
            .unwrap();
        assert_eq!(y[0], 3.5);
    }

    #[test]
    fn matter_dominated_growth_is_linear() {
        // In EdS (E = a^-3/2, Ω_m(a) = 1) the growing mode is D = a.
        let deriv = |a: f64, y: &[f64], dy: &mut [f64]| {
            let e = a.powf(-1.5);
            dy[0] = y[1] / (a * a * a * e);
            dy[1] = 1.5 * e * a * y[0];
        };
        let a0: f64 = 1e-6;
        let mut y = [a0, a0 * a0 * a0 * a0.powf(-1.5)];
        rk45_drive(&deriv, a0, 1.0, &mut y, 0.1 * a0, 1e-8).unwrap();
        assert!(
            (y[0] - 1.0).abs() < 1e-4,
            "EdS growth at a=1 should be 1, got {}",
            y[0]
        );
    }
}
