// SPDX-License-Identifier: AGPL-3.0-only

//! Linear matter power spectrum (BBKS transfer function) and σ(R).
//!
//! The transfer function is the classic Bardeen-Bond-Kaiser-Szalay fit
//! with the Sugiyama shape parameter
//!
//!   Γ = Ω_m h² exp(−Ω_b (1 + √(2h)/Ω_m)),   q = k/Γ,
//!
//! accurate at the few-percent level; adequate for the distance and
//! clustering statistics built on top of it. Primordial-amplitude
//! normalization fixes the spectrum directly from A_s at the pivot
//! scale; σ8 normalization builds a provisional spectrum, measures its
//! σ8 by quadrature, and rescales. Either way the present-day spectrum
//! is tabulated as ln P(ln k) and scaled to other epochs by D²(a).

use std::f64::consts::PI;

use rayon::prelude::*;

use crate::constants::{
    CLIGHT_HMPC, K_MAX, K_MIN, K_PIVOT, N_K, N_SIGMA_R, SIGMA_R_MAX, SIGMA_R_MIN,
};
use crate::cosmology::Cosmology;
use crate::error::CosmoError;
use crate::numerics::{integrate, Spline};
use crate::params::{Normalization, Parameters};
use crate::tolerances::SIGMA_EPSREL;

/// Squared BBKS transfer function T²(k), k in 1/Mpc.
#[must_use]
pub fn tsqr_bbks(params: &Parameters, k: f64) -> f64 {
    let shape = params.omega_m
        * params.h
        * params.h
        * (-params.omega_b * (1.0 + (2.0 * params.h).sqrt() / params.omega_m)).exp();
    let q = k / shape;
    if q < 1e-8 {
        return 1.0;
    }
    let t = (1.0 + 2.34 * q).ln() / (2.34 * q)
        * (1.0
            + 3.89 * q
            + (16.1 * q).powi(2)
            + (5.46 * q).powi(3)
            + (6.71 * q).powi(4))
        .powf(-0.25);
    t * t
}

/// Spherical top-hat window in Fourier space, W(x) = 3(sin x − x cos x)/x³.
fn tophat_window(x: f64) -> f64 {
    if x < 1e-3 {
        // Series expansion; the closed form loses precision near 0.
        return 1.0 - x * x / 10.0;
    }
    3.0 * (x.sin() - x * x.cos()) / (x * x * x)
}

/// RMS overdensity in a top-hat sphere of radius `r` [Mpc] from a
/// tabulated ln P(ln k).
///
/// σ²(R) = (1/2π²) ∫ dln k k³ P(k) W²(kR)
pub(crate) fn sigma_tophat(log_p: &Spline, r: f64) -> Result<f64, CosmoError> {
    let (lnk_lo, lnk_hi) = log_p.domain();
    let integrand = |lnk: f64| {
        let k = lnk.exp();
        let w = tophat_window(k * r);
        k * k * k * log_p.eval(lnk).exp() * w * w
    };
    let var = integrate(&integrand, lnk_lo, lnk_hi, SIGMA_EPSREL)? / (2.0 * PI * PI);
    Ok(var.sqrt())
}

fn lnk_grid() -> Vec<f64> {
    let (lo, hi) = (K_MIN.ln(), K_MAX.ln());
    (0..N_K)
        .map(|i| lo + (hi - lo) * i as f64 / (N_K - 1) as f64)
        .collect()
}

fn compute_power_inner(params: &Parameters) -> Result<Spline, CosmoError> {
    let lnk = lnk_grid();

    match params.norm {
        Normalization::PrimordialAmplitude(a_s) => {
            // Poisson relation between the curvature and density power:
            // P(k) = (8π²/25) A_s (k/k_piv)^(ns−1) k (c/H0)⁴ / Ω_m² T²(k)
            let prefac = 8.0 * PI * PI / 25.0 * a_s * (CLIGHT_HMPC / params.h).powi(4)
                / (params.omega_m * params.omega_m);
            let lnp: Vec<f64> = lnk
                .iter()
                .map(|&l| {
                    let k = l.exp();
                    (prefac * (k / K_PIVOT).powf(params.n_s - 1.0) * k * tsqr_bbks(params, k))
                        .ln()
                })
                .collect();
            Spline::new(&lnk, &lnp)
        }
        Normalization::Sigma8(s8) => {
            // Provisional spectrum with unit amplitude, then rescale so
            // the measured σ8 matches the requested one.
            let lnp_u: Vec<f64> = lnk
                .iter()
                .map(|&l| {
                    let k = l.exp();
                    ((k / K_PIVOT).powf(params.n_s) * tsqr_bbks(params, k)).ln()
                })
                .collect();
            let provisional = Spline::new(&lnk, &lnp_u)?;
            let s8_u = sigma_tophat(&provisional, 8.0 / params.h)?;
            let shift = 2.0 * (s8 / s8_u).ln();
            let lnp: Vec<f64> = lnp_u.iter().map(|&v| v + shift).collect();
            Spline::new(&lnk, &lnp)
        }
    }
}

fn compute_sigma_inner(log_p: &Spline) -> Result<Spline, CosmoError> {
    let (lo, hi) = (SIGMA_R_MIN.ln(), SIGMA_R_MAX.ln());
    let lnr: Vec<f64> = (0..N_SIGMA_R)
        .map(|i| lo + (hi - lo) * i as f64 / (N_SIGMA_R - 1) as f64)
        .collect();
    let lns: Vec<f64> = lnr
        .par_iter()
        .map(|&l| Ok(sigma_tophat(log_p, l.exp())?.ln()))
        .collect::<Result<_, CosmoError>>()?;
    Spline::new(&lnr, &lns)
}

impl Cosmology {
    /// Populate the present-day linear power spline. Idempotent.
    ///
    /// # Errors
    ///
    /// `CosmoError::Integration` or `CosmoError::Spline`, also recorded
    /// in the sticky status.
    pub fn compute_power(&mut self) -> Result<(), CosmoError> {
        if self.computed_power() {
            return Ok(());
        }
        let res = compute_power_inner(&self.params);
        let log_p = self.sticky(res)?;
        self.data.log_p_lin = Some(log_p);
        Ok(())
    }

    /// Populate the σ(R) spline. Idempotent; pulls in the power spline
    /// first if needed.
    pub fn compute_sigma(&mut self) -> Result<(), CosmoError> {
        if self.computed_sigma() {
            return Ok(());
        }
        self.compute_power()?;
        let res = match self.data.log_p_lin.as_ref() {
            Some(log_p) => compute_sigma_inner(log_p),
            None => Err(CosmoError::Spline("cache slot empty after compute".into())),
        };
        let log_sigma = self.sticky(res)?;
        self.data.log_sigma = Some(log_sigma);
        Ok(())
    }

    /// Linear matter power P(k, a) [Mpc³], k in 1/Mpc.
    ///
    /// Scales the tabulated present-day spectrum by D²(a).
    pub fn linear_matter_power(&mut self, k: f64, a: f64) -> Result<f64, CosmoError> {
        self.compute_power()?;
        let res = check_k(k);
        let k = self.sticky(res)?;
        let d = self.growth_factor(a)?;
        let data = &mut self.data;
        let log_p = data
            .log_p_lin
            .as_ref()
            .ok_or_else(|| CosmoError::Spline("cache slot empty after compute".into()))?;
        Ok(log_p.eval_accel(k.ln(), &mut data.accel_k).exp() * d * d)
    }

    /// RMS overdensity σ(R) today, R in Mpc.
    pub fn sigma_r(&mut self, r: f64) -> Result<f64, CosmoError> {
        self.compute_sigma()?;
        let res = check_r(r);
        let r = self.sticky(res)?;
        let data = &self.data;
        let log_sigma = data
            .log_sigma
            .as_ref()
            .ok_or_else(|| CosmoError::Spline("cache slot empty after compute".into()))?;
        Ok(log_sigma.eval(r.ln()).exp())
    }

    /// σ8: RMS overdensity in 8 Mpc/h spheres today.
    pub fn sigma8(&mut self) -> Result<f64, CosmoError> {
        let r8 = 8.0 / self.params.h;
        self.sigma_r(r8)
    }
}

fn check_k(k: f64) -> Result<f64, CosmoError> {
    if !k.is_finite() || k < K_MIN || k > K_MAX {
        return Err(CosmoError::OutOfRange(format!(
            "k = {k} 1/Mpc outside tabulated [{K_MIN:.1e}, {K_MAX:.1e}]"
        )));
    }
    Ok(k)
}

fn check_r(r: f64) -> Result<f64, CosmoError> {
    if !r.is_finite() || r < SIGMA_R_MIN || r > SIGMA_R_MAX {
        return Err(CosmoError::OutOfRange(format!(
            "R = {r} Mpc outside tabulated [{SIGMA_R_MIN}, {SIGMA_R_MAX}]"
        )));
    }
    Ok(r)
}
