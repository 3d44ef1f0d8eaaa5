// SPDX-License-Identifier: AGPL-3.0-only

//! Massive-neutrino energy density via the relativistic phase-space
//! integral.
//!
//! The energy density of one fermionic species of mass m at temperature
//! T is
//!
//!   ρ = (T⁴/π²) ∫₀^∞ dx x² √(x² + r²) / (eˣ + 1),   r = m/T
//!
//! The integral is tabulated once over ln r, normalized to its
//! relativistic edge (r → 0, value 7π⁴/120), and interpolated. Outside
//! the tabulated domain the two asymptotes are exact:
//! 7/8 of the photon factor in the relativistic limit, and a linear
//! growth `NONREL_SLOPE · r` in the non-relativistic limit
//! (ratio of the second to third Fermi-Dirac moments, times 7/8).

use std::f64::consts::PI;
use std::sync::OnceLock;

use rayon::prelude::*;

use crate::constants::{
    K_PER_EV, NU_MNUT_MAX, NU_MNUT_MIN, NU_MNUT_N, NU_MOMENTUM_CUT, RHO_CRIT_EV4, TNCDM,
};
use crate::error::CosmoError;
use crate::numerics::{integrate, Spline};
use crate::tolerances::NU_PHASESPACE_EPSREL;

/// Non-relativistic slope of the normalized phase-space integral:
/// (7/8) × [∫x²/(eˣ+1)] / [∫x³/(eˣ+1)] = (7/8) × (3ζ(3)/2) / (7π⁴/120).
pub const NONREL_SLOPE: f64 = 0.277_656_633_7;

/// Photon density parameter times h², from the CMB temperature [K].
pub(crate) fn omega_g_h2(t_cmb: f64) -> f64 {
    let t_ev = t_cmb / K_PER_EV;
    PI * PI / 15.0 * t_ev.powi(4) / RHO_CRIT_EV4
}

/// One-time table of the normalized neutrino phase-space integral.
///
/// Pure function of physical constants; read-only after construction
/// and shareable across any number of parameter derivations.
#[derive(Debug, Clone)]
pub struct PhaseSpaceTable {
    /// F(ln r) = I(r)/I(0), sampled over ln r ∈ [ln r_min, ln r_max].
    spline: Spline,
}

impl PhaseSpaceTable {
    /// Build the table by direct quadrature of the momentum integral at
    /// `NU_MNUT_N` log-spaced mass/temperature ratios.
    ///
    /// # Errors
    ///
    /// `CosmoError::Integration` if any row fails to converge — fatal
    /// to startup in practice, never a per-call condition.
    pub fn build() -> Result<Self, CosmoError> {
        let ln_min = NU_MNUT_MIN.ln();
        let ln_max = NU_MNUT_MAX.ln();
        let n = NU_MNUT_N;
        let ln_r: Vec<f64> = (0..n)
            .map(|i| ln_min + (ln_max - ln_min) * i as f64 / (n - 1) as f64)
            .collect();

        let mut vals: Vec<f64> = ln_r
            .par_iter()
            .map(|&lr| {
                let r = lr.exp();
                integrate(
                    &|x: f64| x * x * (x * x + r * r).sqrt() / (x.exp() + 1.0),
                    0.0,
                    NU_MOMENTUM_CUT,
                    NU_PHASESPACE_EPSREL,
                )
            })
            .collect::<Result<_, _>>()?;

        // Normalize to the relativistic edge so F(r_min) = 1.
        let renorm = 1.0 / vals[0];
        for v in &mut vals {
            *v *= renorm;
        }

        Ok(Self {
            spline: Spline::new(&ln_r, &vals)?,
        })
    }

    /// Process-wide shared instance, built on first use.
    ///
    /// # Panics
    ///
    /// Panics if the one-time table construction fails; per the
    /// contract this is fatal to startup, not recoverable per call.
    pub fn shared() -> &'static Self {
        static TABLE: OnceLock<PhaseSpaceTable> = OnceLock::new();
        TABLE.get_or_init(|| match Self::build() {
            Ok(t) => t,
            Err(e) => panic!("neutrino phase-space table construction failed: {e}"),
        })
    }

    /// Normalized phase-space integral (7/8)·F(r) at reduced mass `mnuot`.
    ///
    /// Clamps to the exact asymptotes outside the tabulated domain:
    /// 7/8 below `NU_MNUT_MIN`, `NONREL_SLOPE · r` above `NU_MNUT_MAX`.
    #[must_use]
    pub fn integral(&self, mnuot: f64) -> f64 {
        if mnuot < NU_MNUT_MIN {
            return 7.0 / 8.0;
        }
        if mnuot > NU_MNUT_MAX {
            return NONREL_SLOPE * mnuot;
        }
        self.spline.eval(mnuot.ln()) * 7.0 / 8.0
    }
}

/// Neutrino contribution to the density parameter, Ω_ν h², at scale
/// factor `a`.
///
/// `n_eff` is the effective species count, `mnu` the summed mass in eV
/// (equal masses assumed), `t_cmb` the CMB temperature in Kelvin. For
/// `mnu = 0` this reduces to the closed-form massless result,
/// `n_eff · (7/8) · (π²/15) T_ν⁴ / ρ_crit / a⁴`, with
/// `T_ν = (4/11)^⅓ T_CMB`. Massive species use the CLASS effective
/// temperature `TNCDM · T_CMB` so that the non-relativistic limit
/// satisfies Σm_ν/(Ω_ν h²) = 93.14 eV.
#[must_use]
pub fn omega_nu_h2(a: f64, n_eff: f64, mnu: f64, t_cmb: f64, table: &PhaseSpaceTable) -> f64 {
    if n_eff == 0.0 {
        return 0.0;
    }
    let a4 = a * a * a * a;
    let tnu = t_cmb * (4.0_f64 / 11.0).powf(1.0 / 3.0);

    if mnu == 0.0 {
        let prefac = PI * PI / 15.0 * (tnu / K_PER_EV).powi(4) / RHO_CRIT_EV4;
        return n_eff * prefac * (7.0 / 8.0) / a4;
    }

    let tnu_eff = TNCDM * t_cmb;
    let mnu_one = mnu / n_eff;
    // Reduced mass/temperature at epoch a: the temperature dilutes as 1/a.
    let mnuot = mnu_one * K_PER_EV * a / tnu_eff;
    let intval = table.integral(mnuot);
    let prefac = PI * PI / 15.0 * (tnu_eff / K_PER_EV).powi(4) / RHO_CRIT_EV4;
    n_eff * intval * prefac / a4
}
