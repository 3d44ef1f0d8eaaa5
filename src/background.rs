// SPDX-License-Identifier: AGPL-3.0-only

//! Background expansion, comoving distances, and linear growth.
//!
//! The normalized expansion rate is
//!
//!   E²(a) = [Ω_m + Ω_Λ a^(−3(w0+wa)) e^(3wa(a−1)) + Ω_k a + Ω_r / a] / a³
//!
//! with Ω_r = Ω_γ + Ω_ν,rel and the CPL dark-energy equation of state
//! w(a) = w0 + (1−a) wa. Massive neutrinos dilute as matter and are
//! carried inside Ω_m. All density parameters enter E, so E(1) = 1
//! exactly by the closure relation.
//!
//! Distances integrate dχ = c da / (a² H); the inverse relation a(χ)
//! is tabulated by Newton inversion of the distance spline. Growth
//! solves the second-order ODE for the growing mode D(a) as the
//! first-order system
//!
//!   y = [D, a³ E dD/da],
//!   dy0/da = y1 / (a³ E),   dy1/da = (3/2) Ω_m y0 / (a² E)
//!
//! from deep in matter domination, normalized so D(1) = 1. A supplied
//! modified-growth table shifts the growth rate by Δf(a) and rescales
//! D by exp(−∫_a^1 Δf dln a').

use rayon::prelude::*;

use crate::constants::{
    A_SPLINE_MAX, A_SPLINE_MIN, A_SPLINE_NA, CHI_SPACING_MPC, CLIGHT_HMPC, GROWTH_A_INIT,
};
use crate::cosmology::Cosmology;
use crate::error::CosmoError;
use crate::numerics::{integrate, newton, rk45_drive, Spline};
use crate::params::Parameters;
use crate::tolerances::{ACHI_NEWTON_EPSABS, DIST_EPSREL, GROWTH_EPSREL};

/// Scale factors within this of 1 map to today (χ = 0, D = 1).
const A_EPS_TODAY: f64 = 1e-8;
/// Distances below this are treated as exactly today.
const CHI_EPS_TODAY: f64 = 1e-8;

/// Density components of the background budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Species {
    /// Baryons, cold dark matter, and massive neutrinos.
    Matter,
    /// Dark energy with the CPL equation of state.
    DarkEnergy,
    /// Photons plus massless neutrinos.
    Radiation,
    /// Spatial curvature.
    Curvature,
}

/// Normalized expansion rate E(a) = H(a)/H0.
#[must_use]
pub fn h_over_h0(params: &Parameters, a: f64) -> f64 {
    let de = params.omega_l
        * a.powf(-3.0 * (params.w0 + params.wa))
        * (3.0 * params.wa * (a - 1.0)).exp();
    let rad = (params.omega_g + params.omega_n_rel) / a;
    ((params.omega_m + de + params.omega_k * a + rad) / (a * a * a)).sqrt()
}

/// Fractional density Ω_x(a) of one species.
#[must_use]
pub fn omega_x(params: &Parameters, a: f64, species: Species) -> f64 {
    let e2 = {
        let e = h_over_h0(params, a);
        e * e
    };
    let a3 = a * a * a;
    match species {
        Species::Matter => params.omega_m / (a3 * e2),
        Species::DarkEnergy => {
            params.omega_l
                * a.powf(-3.0 * (1.0 + params.w0 + params.wa))
                * (3.0 * params.wa * (a - 1.0)).exp()
                / e2
        }
        Species::Radiation => (params.omega_g + params.omega_n_rel) / (a3 * a * e2),
        Species::Curvature => params.omega_k / (a * a * e2),
    }
}

/// Comoving radial distance χ(a) [Mpc] by direct quadrature.
fn chi_of_a(params: &Parameters, a: f64) -> Result<f64, CosmoError> {
    if a >= 1.0 - A_EPS_TODAY {
        return Ok(0.0);
    }
    let integrand = |ap: f64| CLIGHT_HMPC / (ap * ap * h_over_h0(params, ap));
    Ok(integrate(&integrand, a, 1.0, DIST_EPSREL)? / params.h)
}

fn a_grid() -> Vec<f64> {
    (0..A_SPLINE_NA)
        .map(|i| {
            A_SPLINE_MIN + (A_SPLINE_MAX - A_SPLINE_MIN) * i as f64 / (A_SPLINE_NA - 1) as f64
        })
        .collect()
}

/// Unnormalized growing mode and growth rate at one scale factor.
///
/// Returns (D, f) from the ODE integrated out of matter domination.
fn growth_ode_at(params: &Parameters, a: f64) -> Result<(f64, f64), CosmoError> {
    let a0 = GROWTH_A_INIT;
    if a <= a0 {
        return Ok((a, 1.0));
    }
    let deriv = |ap: f64, y: &[f64], dy: &mut [f64]| {
        let e = h_over_h0(params, ap);
        dy[0] = y[1] / (ap * ap * ap * e);
        dy[1] = 1.5 * params.omega_m * y[0] / (ap * ap * e);
    };
    // Matter-dominated initial conditions: D = a, dD/da = 1.
    let mut y = [a0, a0 * a0 * a0 * h_over_h0(params, a0)];
    rk45_drive(&deriv, a0, a, &mut y, 0.1 * a0, GROWTH_EPSREL)?;
    let d = y[0];
    let f = y[1] / (a * a * h_over_h0(params, a) * d);
    Ok((d, f))
}

/// Modified-growth corrections at one scale factor: (Δf(a), ∫_a^1 Δf dln a').
fn mgrowth_correction(df_of_a: &Spline, a: f64) -> Result<(f64, f64), CosmoError> {
    let df = df_of_a.eval(a);
    let integral = integrate(&|ap: f64| df_of_a.eval(ap) / ap, a, 1.0, GROWTH_EPSREL)?;
    Ok((df, integral))
}

impl Cosmology {
    /// Populate the background splines: E(a), χ(a), and a(χ).
    ///
    /// Idempotent; a second call returns immediately.
    ///
    /// # Errors
    ///
    /// `CosmoError::Integration` or `CosmoError::Spline` on failure,
    /// also recorded in the sticky status.
    pub fn compute_distances(&mut self) -> Result<(), CosmoError> {
        if self.computed_distances() {
            return Ok(());
        }
        let res = compute_distances_inner(&self.params);
        let (e, chi, achi) = self.sticky(res)?;
        self.data.e = Some(e);
        self.data.chi = Some(chi);
        self.data.achi = Some(achi);
        Ok(())
    }

    /// Populate the growth splines D(a) and f(a).
    ///
    /// Idempotent; a second call returns immediately.
    ///
    /// # Errors
    ///
    /// `CosmoError::Integration` or `CosmoError::Spline` on failure,
    /// also recorded in the sticky status.
    pub fn compute_growth(&mut self) -> Result<(), CosmoError> {
        if self.computed_growth() {
            return Ok(());
        }
        let res = compute_growth_inner(&self.params);
        let (growth, fgrowth, growth0) = self.sticky(res)?;
        self.data.growth = Some(growth);
        self.data.fgrowth = Some(fgrowth);
        self.data.growth0 = growth0;
        Ok(())
    }

    /// E(a) = H(a)/H0 from the tabulated spline.
    pub fn expansion_rate(&mut self, a: f64) -> Result<f64, CosmoError> {
        self.compute_distances()?;
        let res = check_a(a);
        let a = self.sticky(res)?;
        let data = &mut self.data;
        let sp = data.e.as_ref().ok_or_else(missing_spline)?;
        Ok(sp.eval_accel(a, &mut data.accel))
    }

    /// Comoving radial distance χ(a) [Mpc].
    pub fn comoving_radial_distance(&mut self, a: f64) -> Result<f64, CosmoError> {
        self.compute_distances()?;
        let res = check_a(a);
        let a = self.sticky(res)?;
        if a >= 1.0 - A_EPS_TODAY {
            return Ok(0.0);
        }
        let data = &mut self.data;
        let sp = data.chi.as_ref().ok_or_else(missing_spline)?;
        Ok(sp.eval_accel(a, &mut data.accel))
    }

    /// Comoving angular-diameter distance [Mpc]: sin-like transform of
    /// χ according to the curvature sign.
    pub fn comoving_angular_distance(&mut self, a: f64) -> Result<f64, CosmoError> {
        let chi = self.comoving_radial_distance(a)?;
        let p = &self.params;
        Ok(match p.k_sign {
            1 => (p.sqrtk * chi).sin() / p.sqrtk,
            -1 => (p.sqrtk * chi).sinh() / p.sqrtk,
            _ => chi,
        })
    }

    /// Luminosity distance [Mpc], χ(a)/a for the radial convention.
    pub fn luminosity_distance(&mut self, a: f64) -> Result<f64, CosmoError> {
        Ok(self.comoving_radial_distance(a)? / a)
    }

    /// Scale factor at comoving radial distance `chi` [Mpc].
    pub fn scale_factor_of_chi(&mut self, chi: f64) -> Result<f64, CosmoError> {
        self.compute_distances()?;
        if chi.abs() < CHI_EPS_TODAY {
            return Ok(1.0);
        }
        let res = check_chi(chi, self.data.achi.as_ref().ok_or_else(missing_spline)?);
        let chi = self.sticky(res)?;
        let data = &mut self.data;
        let sp = data.achi.as_ref().ok_or_else(missing_spline)?;
        Ok(sp.eval_accel(chi, &mut data.accel_achi))
    }

    /// Normalized growth factor D(a), with D(1) = 1.
    pub fn growth_factor(&mut self, a: f64) -> Result<f64, CosmoError> {
        self.compute_growth()?;
        let res = check_a(a);
        let a = self.sticky(res)?;
        let data = &mut self.data;
        let sp = data.growth.as_ref().ok_or_else(missing_spline)?;
        Ok(sp.eval_accel(a, &mut data.accel))
    }

    /// Unnormalized growth factor, D(a) times the ODE value at a = 1.
    pub fn growth_factor_unnorm(&mut self, a: f64) -> Result<f64, CosmoError> {
        let g = self.growth_factor(a)?;
        Ok(g * self.data.growth0)
    }

    /// Growth rate f(a) = dln D / dln a.
    pub fn growth_rate(&mut self, a: f64) -> Result<f64, CosmoError> {
        self.compute_growth()?;
        let res = check_a(a);
        let a = self.sticky(res)?;
        let data = &mut self.data;
        let sp = data.fgrowth.as_ref().ok_or_else(missing_spline)?;
        Ok(sp.eval_accel(a, &mut data.accel))
    }
}

fn missing_spline() -> CosmoError {
    CosmoError::Spline("cache slot empty after compute".into())
}

/// Validate a scale-factor query against the tabulated domain.
fn check_a(a: f64) -> Result<f64, CosmoError> {
    if !a.is_finite() {
        return Err(CosmoError::OutOfRange(format!("a = {a} is not finite")));
    }
    if a > 1.0 + A_EPS_TODAY {
        return Err(CosmoError::OutOfRange(format!("a = {a} is in the future")));
    }
    if a < A_SPLINE_MIN {
        return Err(CosmoError::OutOfRange(format!(
            "a = {a} below tabulated minimum {A_SPLINE_MIN}"
        )));
    }
    Ok(a.min(1.0))
}

fn check_chi(chi: f64, achi: &Spline) -> Result<f64, CosmoError> {
    let (lo, hi) = achi.domain();
    if !chi.is_finite() || chi < lo || chi > hi {
        return Err(CosmoError::OutOfRange(format!(
            "chi = {chi} Mpc outside tabulated [{lo:.1}, {hi:.1}]"
        )));
    }
    Ok(chi)
}

fn compute_distances_inner(
    params: &Parameters,
) -> Result<(Spline, Spline, Spline), CosmoError> {
    let a = a_grid();
    let e_vals: Vec<f64> = a.iter().map(|&ai| h_over_h0(params, ai)).collect();
    let e = Spline::new(&a, &e_vals)?;

    let chi_vals: Vec<f64> = a
        .par_iter()
        .map(|&ai| chi_of_a(params, ai))
        .collect::<Result<_, _>>()?;
    let chi = Spline::new(&a, &chi_vals)?;

    // Invert chi(a) on an evenly spaced distance grid by Newton
    // iteration, warm-started from the previous solution.
    let chi_max = chi_vals[0];
    let n_chi = ((chi_max / CHI_SPACING_MPC).ceil() as usize).max(3) + 1;
    let mut chi_grid = Vec::with_capacity(n_chi);
    let mut a_of_chi = Vec::with_capacity(n_chi);
    chi_grid.push(0.0);
    a_of_chi.push(1.0);
    let mut guess = 1.0 - 1e-4;
    for i in 1..n_chi {
        let chi_i = chi_max * i as f64 / (n_chi - 1) as f64;
        let f = |av: f64| chi.eval(av) - chi_i;
        let dchi_da =
            |av: f64| -CLIGHT_HMPC / (av * av * h_over_h0(params, av) * params.h);
        let ai = newton(&f, &dchi_da, guess, A_SPLINE_MIN, 1.0, ACHI_NEWTON_EPSABS)?;
        guess = ai;
        chi_grid.push(chi_i);
        a_of_chi.push(ai);
    }
    let achi = Spline::new(&chi_grid, &a_of_chi)?;

    Ok((e, chi, achi))
}

fn compute_growth_inner(params: &Parameters) -> Result<(Spline, Spline, f64), CosmoError> {
    let a = a_grid();

    // Δf(a) spline from the supplied (z, Δf) samples, low a first.
    // Validation guarantees a present table has at least 3 samples.
    let df_of_a = match &params.mgrowth {
        Some(mg) => {
            let mut a_mg: Vec<f64> = mg.z.iter().map(|&z| 1.0 / (1.0 + z)).collect();
            let mut df_mg = mg.df.clone();
            a_mg.reverse();
            df_mg.reverse();
            Some(Spline::new(&a_mg, &df_mg)?)
        }
        None => None,
    };

    let raw: Vec<(f64, f64)> = a
        .par_iter()
        .map(|&ai| {
            let (mut d, mut f) = growth_ode_at(params, ai)?;
            if let Some(df_sp) = &df_of_a {
                let (df, integral) = mgrowth_correction(df_sp, ai)?;
                f += df;
                d *= (-integral).exp();
            }
            Ok((d, f))
        })
        .collect::<Result<_, CosmoError>>()?;

    let (growth0, _) = {
        let mut d1 = growth_ode_at(params, 1.0)?;
        if let Some(df_sp) = &df_of_a {
            let (_, integral) = mgrowth_correction(df_sp, 1.0)?;
            d1.0 *= (-integral).exp();
        }
        d1
    };

    let d_vals: Vec<f64> = raw.iter().map(|&(d, _)| d / growth0).collect();
    let f_vals: Vec<f64> = raw.iter().map(|&(_, f)| f).collect();

    Ok((
        Spline::new(&a, &d_vals)?,
        Spline::new(&a, &f_vals)?,
        growth0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{GrowthModification, Normalization, PrimaryParams};
    use crate::tolerances::EXACT_F64;

    fn flat_lcdm() -> Parameters {
        Parameters::flat_lcdm(0.25, 0.05, 0.7, Normalization::Sigma8(0.8), 0.96).unwrap()
    }

    #[test]
    fn expansion_rate_is_unity_today() {
        // Closure puts every component into E, so E(1) = 1 exactly.
        let params = flat_lcdm();
        assert!((h_over_h0(&params, 1.0) - 1.0).abs() <= EXACT_F64);

        let with_nu = Parameters::flat_lcdm_nu(
            0.25,
            0.05,
            0.7,
            Normalization::Sigma8(0.8),
            0.96,
            0.0,
            3.0,
            0.12,
        )
        .unwrap();
        assert!((h_over_h0(&with_nu, 1.0) - 1.0).abs() <= EXACT_F64);
    }

    #[test]
    fn expansion_rate_matter_scaling_in_the_past() {
        // Deep in matter domination E ≈ √(Ω_m) a^(-3/2).
        let params = flat_lcdm();
        let a = 0.1;
        let expected = (params.omega_m / (a * a * a)).sqrt();
        let rel = (h_over_h0(&params, a) / expected - 1.0).abs();
        assert!(rel < 0.05, "E(0.1) far from matter scaling: {rel:.3}");
    }

    #[test]
    fn omega_x_fractions_sum_to_one() {
        let params = Parameters::lcdm(0.25, 0.05, 0.03, 0.7, Normalization::Sigma8(0.8), 0.96)
            .unwrap();
        for &a in &[1.0, 0.5, 0.2] {
            let total = omega_x(&params, a, Species::Matter)
                + omega_x(&params, a, Species::DarkEnergy)
                + omega_x(&params, a, Species::Radiation)
                + omega_x(&params, a, Species::Curvature);
            assert!(
                (total - 1.0).abs() < 1e-12,
                "fractions at a = {a} sum to {total}"
            );
        }
    }

    #[test]
    fn matter_fraction_grows_into_the_past() {
        let params = flat_lcdm();
        assert!(
            omega_x(&params, 0.3, Species::Matter) > omega_x(&params, 1.0, Species::Matter)
        );
        assert!((omega_x(&params, 1.0, Species::Matter) - 0.30).abs() < 1e-3);
    }

    #[test]
    fn distance_query_validates_domain() {
        let mut cosmo = Cosmology::new(flat_lcdm());
        assert!(cosmo.comoving_radial_distance(1.5).is_err(), "future epoch");
        assert!(cosmo.comoving_radial_distance(0.01).is_err(), "below table");
        assert!(cosmo.comoving_radial_distance(f64::NAN).is_err());
        // The model stays usable after a rejected query.
        assert!(cosmo.comoving_radial_distance(0.5).is_ok());
    }

    #[test]
    fn distance_vanishes_today() {
        let mut cosmo = Cosmology::new(flat_lcdm());
        assert_eq!(cosmo.comoving_radial_distance(1.0).unwrap(), 0.0);
        assert_eq!(cosmo.scale_factor_of_chi(0.0).unwrap(), 1.0);
    }

    #[test]
    fn angular_distance_reduces_to_chi_when_flat() {
        let mut cosmo = Cosmology::new(flat_lcdm());
        let a = 0.5;
        let chi = cosmo.comoving_radial_distance(a).unwrap();
        let da = cosmo.comoving_angular_distance(a).unwrap();
        assert_eq!(chi, da);
    }

    #[test]
    fn open_geometry_stretches_angular_distance() {
        let open = Parameters::lcdm(0.25, 0.05, 0.05, 0.7, Normalization::Sigma8(0.8), 0.96)
            .unwrap();
        let mut cosmo = Cosmology::new(open);
        let a = 0.4;
        let chi = cosmo.comoving_radial_distance(a).unwrap();
        let da = cosmo.comoving_angular_distance(a).unwrap();
        assert!(da > chi, "sinh(x) > x for open geometry: {da} vs {chi}");
    }

    #[test]
    fn growth_is_normalized_today() {
        let mut cosmo = Cosmology::new(flat_lcdm());
        let d1 = cosmo.growth_factor(1.0).unwrap();
        assert!((d1 - 1.0).abs() < 1e-6, "D(1) = {d1}");
        let unnorm = cosmo.growth_factor_unnorm(1.0).unwrap();
        // The mode starts at D = a₀ = 1e-6 and stalls logarithmically
        // through radiation domination, so the unnormalized value at
        // a = 1 stays well below 1 (≈ 0.03 for this model).
        assert!(
            unnorm > 0.0 && unnorm < 1.0,
            "D_unnorm(1) = {unnorm}, expected in (0, 1)"
        );
    }

    #[test]
    fn growth_rate_today_matches_omega_m_power_law() {
        // f(1) ≈ Ω_m^0.55 ≈ 0.51 for Ω_m = 0.3 (Linder approximation).
        let mut cosmo = Cosmology::new(flat_lcdm());
        let f1 = cosmo.growth_rate(1.0).unwrap();
        let approx = 0.30_f64.powf(0.55);
        assert!(
            (f1 - approx).abs() < 0.02,
            "f(1) = {f1:.4}, Linder gives {approx:.4}"
        );
    }

    #[test]
    fn modified_growth_shifts_rate_and_factor() {
        let primary = PrimaryParams {
            omega_c: 0.25,
            omega_b: 0.05,
            omega_k: 0.0,
            n_nu_rel: 0.0,
            n_nu_mass: 0.0,
            mnu: 0.0,
            w0: -1.0,
            wa: 0.0,
            h: 0.7,
            norm: Normalization::Sigma8(0.8),
            n_s: 0.96,
            mgrowth: Some(GrowthModification {
                z: vec![0.0, 0.5, 1.0, 2.0],
                df: vec![0.05; 4],
            }),
        };
        let mut modified = Cosmology::from_primary(&primary).unwrap();
        let mut baseline = Cosmology::new(flat_lcdm());

        let a = 0.5;
        let f_mod = modified.growth_rate(a).unwrap();
        let f_base = baseline.growth_rate(a).unwrap();
        assert!(
            (f_mod - f_base - 0.05).abs() < 1e-3,
            "constant Δf must shift f: {f_mod} vs {f_base}"
        );

        // D still normalized today, suppressed in the past relative to
        // baseline (positive Δf means steeper recent growth).
        let d1 = modified.growth_factor(1.0).unwrap();
        assert!((d1 - 1.0).abs() < 1e-6);
        let d_mod = modified.growth_factor(a).unwrap();
        let d_base = baseline.growth_factor(a).unwrap();
        assert!(d_mod < d_base, "{d_mod} !< {d_base}");
    }
}
