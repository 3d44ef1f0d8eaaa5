// SPDX-License-Identifier: AGPL-3.0-only

//! Primary parameters, validation, and derivation of the complete
//! cosmological parameter record.
//!
//! [`PrimaryParams`] is the user-facing input; [`Parameters::derive`]
//! validates it and produces the immutable [`Parameters`] record with
//! all secondary quantities filled in. Dark energy closes the budget:
//!
//!   Ω_Λ = 1 − Ω_m − Ω_γ − Ω_ν,rel − Ω_k
//!
//! so the density closure holds by construction. The power-spectrum
//! normalization is a tagged [`Normalization`] — exactly one of A_s and
//! σ8 exists, enforced by the type rather than a NaN sentinel.

use serde::{Deserialize, Serialize};

use crate::constants::{CLIGHT_HMPC, T_CMB};
use crate::error::CosmoError;
use crate::neutrinos::{omega_g_h2, omega_nu_h2, PhaseSpaceTable};

/// Power-spectrum normalization: primordial amplitude or present-day σ8.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Primordial scalar amplitude A_s at the pivot scale.
    PrimordialAmplitude(f64),
    /// RMS fluctuation in 8 Mpc/h top-hat spheres today.
    Sigma8(f64),
}

impl Normalization {
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            Self::PrimordialAmplitude(v) | Self::Sigma8(v) => v,
        }
    }
}

/// Modified-growth samples: Δf at tabulated redshifts, lowest first.
///
/// The growth rate becomes f + Δf and the growth factor is multiplied
/// by exp(−∫ Δf dln a). A non-empty table must carry at least 3
/// samples (the interpolant cannot be anchored on fewer); an empty
/// table means no modification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthModification {
    pub z: Vec<f64>,
    pub df: Vec<f64>,
}

/// User-supplied primary parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryParams {
    /// Cold dark matter density parameter.
    pub omega_c: f64,
    /// Baryon density parameter.
    pub omega_b: f64,
    /// Curvature density parameter.
    pub omega_k: f64,
    /// Effective number of massless neutrino species.
    pub n_nu_rel: f64,
    /// Effective number of massive neutrino species.
    pub n_nu_mass: f64,
    /// Summed neutrino mass [eV], split equally across massive species.
    pub mnu: f64,
    /// Dark-energy equation of state today.
    pub w0: f64,
    /// Dark-energy equation-of-state evolution, w(a) = w0 + (1−a) wa.
    pub wa: f64,
    /// Dimensionless Hubble constant, H0 / (100 km/s/Mpc).
    pub h: f64,
    /// Power-spectrum normalization (A_s or σ8, never both).
    pub norm: Normalization,
    /// Primordial spectral index.
    pub n_s: f64,
    /// Optional modified-growth table; `None` or empty means absent.
    #[serde(default)]
    pub mgrowth: Option<GrowthModification>,
}

/// Complete, internally consistent parameter record.
///
/// Immutable once derived; every `Cosmology` owns one by value.
#[derive(Debug, Clone)]
pub struct Parameters {
    // Primary
    pub omega_c: f64,
    pub omega_b: f64,
    pub omega_k: f64,
    pub n_nu_rel: f64,
    pub n_nu_mass: f64,
    pub mnu: f64,
    pub w0: f64,
    pub wa: f64,
    pub h: f64,
    pub norm: Normalization,
    pub n_s: f64,

    // Derived
    /// Hubble constant [km/s/Mpc] = 100 h.
    pub h0: f64,
    /// CMB temperature [K] (fixed constant).
    pub t_cmb: f64,
    /// Photon density parameter.
    pub omega_g: f64,
    /// Massless-neutrino density parameter.
    pub omega_n_rel: f64,
    /// Massive-neutrino density parameter.
    pub omega_n_mass: f64,
    /// Total neutrino density parameter.
    pub omega_n: f64,
    /// Total matter: Ω_b + Ω_c + Ω_ν,mass.
    pub omega_m: f64,
    /// Dark energy, closure term of the density budget.
    pub omega_l: f64,
    /// Recombination redshift — reserved for a later collaborator,
    /// unset at derivation.
    pub z_star: Option<f64>,

    /// Sign of the spatial curvature constant K = −Ω_k (H0/c)²:
    /// +1 closed, 0 flat, −1 open.
    pub k_sign: i8,
    /// √|Ω_k| · h / `CLIGHT_HMPC` [1/Mpc]; 0 when flat.
    pub sqrtk: f64,

    /// Deep-copied modified-growth table, absent unless samples were
    /// supplied.
    pub mgrowth: Option<GrowthModification>,
}

fn validate(p: &PrimaryParams) -> Result<(), CosmoError> {
    let err = |msg: String| Err(CosmoError::Parameters(msg));
    let finite = [
        ("Omega_c", p.omega_c),
        ("Omega_b", p.omega_b),
        ("Omega_k", p.omega_k),
        ("N_nu_rel", p.n_nu_rel),
        ("N_nu_mass", p.n_nu_mass),
        ("mnu", p.mnu),
        ("w0", p.w0),
        ("wa", p.wa),
        ("h", p.h),
        ("n_s", p.n_s),
        ("normalization", p.norm.value()),
    ];
    for (name, v) in finite {
        if !v.is_finite() {
            return err(format!("{name} must be finite, got {v}"));
        }
    }
    if p.omega_c < 0.0 || p.omega_b < 0.0 {
        return err(format!(
            "density parameters must be non-negative: Omega_c = {}, Omega_b = {}",
            p.omega_c, p.omega_b
        ));
    }
    if p.h <= 0.0 {
        return err(format!("h must be positive, got {}", p.h));
    }
    if p.n_nu_rel < 0.0 || p.n_nu_mass < 0.0 {
        return err(format!(
            "neutrino species counts must be non-negative: N_rel = {}, N_mass = {}",
            p.n_nu_rel, p.n_nu_mass
        ));
    }
    if p.mnu < 0.0 {
        return err(format!("summed neutrino mass must be non-negative, got {}", p.mnu));
    }
    if p.mnu > 0.0 && p.n_nu_mass == 0.0 {
        return err("mnu > 0 requires a positive massive species count".into());
    }
    if p.norm.value() <= 0.0 {
        return err(format!(
            "normalization must be positive, got {}",
            p.norm.value()
        ));
    }
    if let Some(mg) = &p.mgrowth {
        if mg.z.len() != mg.df.len() {
            return err(format!(
                "modified-growth arrays must match: {} redshifts, {} df samples",
                mg.z.len(),
                mg.df.len()
            ));
        }
        if !mg.z.is_empty() && mg.z.len() < 3 {
            return err(format!(
                "modified-growth table needs at least 3 samples to interpolate, got {}",
                mg.z.len()
            ));
        }
        for w in mg.z.windows(2) {
            if !(w[1] > w[0]) {
                return err("modified-growth redshifts must be strictly increasing".into());
            }
        }
    }
    Ok(())
}

impl Parameters {
    /// Derive the complete record from primary parameters.
    ///
    /// Radiation comes from the fixed CMB temperature, neutrino
    /// densities from the shared phase-space table evaluated at a = 1,
    /// and dark energy closes the budget. Modified-growth samples are
    /// deep-copied; the record never aliases caller buffers.
    ///
    /// # Errors
    ///
    /// `CosmoError::Parameters` on non-finite, negative, or mutually
    /// inconsistent inputs (validation is strict by design).
    pub fn derive(primary: &PrimaryParams) -> Result<Self, CosmoError> {
        validate(primary)?;
        let p = primary;
        let h2 = p.h * p.h;

        let omega_g = omega_g_h2(T_CMB) / h2;

        let table = PhaseSpaceTable::shared();
        let omega_n_rel = omega_nu_h2(1.0, p.n_nu_rel, 0.0, T_CMB, table) / h2;
        let omega_n_mass = omega_nu_h2(1.0, p.n_nu_mass, p.mnu, T_CMB, table) / h2;
        let omega_n = omega_n_rel + omega_n_mass;

        let omega_m = p.omega_b + p.omega_c + omega_n_mass;
        let omega_l = 1.0 - omega_m - omega_g - omega_n_rel - p.omega_k;

        let (k_sign, sqrtk) = if p.omega_k > 0.0 {
            (-1, p.omega_k.abs().sqrt() * p.h / CLIGHT_HMPC)
        } else if p.omega_k < 0.0 {
            (1, p.omega_k.abs().sqrt() * p.h / CLIGHT_HMPC)
        } else {
            (0, 0.0)
        };

        let mgrowth = p
            .mgrowth
            .as_ref()
            .filter(|mg| !mg.z.is_empty())
            .cloned();

        Ok(Self {
            omega_c: p.omega_c,
            omega_b: p.omega_b,
            omega_k: p.omega_k,
            n_nu_rel: p.n_nu_rel,
            n_nu_mass: p.n_nu_mass,
            mnu: p.mnu,
            w0: p.w0,
            wa: p.wa,
            h: p.h,
            norm: p.norm,
            n_s: p.n_s,
            h0: 100.0 * p.h,
            t_cmb: T_CMB,
            omega_g,
            omega_n_rel,
            omega_n_mass,
            omega_n,
            omega_m,
            omega_l,
            z_star: None,
            k_sign,
            sqrtk,
            mgrowth,
        })
    }

    /// Sum of all density parameters; 1 by construction.
    #[must_use]
    pub fn density_closure(&self) -> f64 {
        self.omega_m + self.omega_g + self.omega_n_rel + self.omega_k + self.omega_l
    }

    // ── Convenience constructors: thin parameter-default wrappers ──

    /// Flat ΛCDM, no massive neutrinos.
    pub fn flat_lcdm(
        omega_c: f64,
        omega_b: f64,
        h: f64,
        norm: Normalization,
        n_s: f64,
    ) -> Result<Self, CosmoError> {
        Self::derive(&PrimaryParams {
            omega_c,
            omega_b,
            omega_k: 0.0,
            n_nu_rel: 0.0,
            n_nu_mass: 0.0,
            mnu: 0.0,
            w0: -1.0,
            wa: 0.0,
            h,
            norm,
            n_s,
            mgrowth: None,
        })
    }

    /// Flat ΛCDM with neutrinos.
    #[allow(clippy::too_many_arguments)]
    pub fn flat_lcdm_nu(
        omega_c: f64,
        omega_b: f64,
        h: f64,
        norm: Normalization,
        n_s: f64,
        n_nu_rel: f64,
        n_nu_mass: f64,
        mnu: f64,
    ) -> Result<Self, CosmoError> {
        Self::derive(&PrimaryParams {
            omega_c,
            omega_b,
            omega_k: 0.0,
            n_nu_rel,
            n_nu_mass,
            mnu,
            w0: -1.0,
            wa: 0.0,
            h,
            norm,
            n_s,
            mgrowth: None,
        })
    }

    /// ΛCDM with curvature.
    pub fn lcdm(
        omega_c: f64,
        omega_b: f64,
        omega_k: f64,
        h: f64,
        norm: Normalization,
        n_s: f64,
    ) -> Result<Self, CosmoError> {
        Self::derive(&PrimaryParams {
            omega_c,
            omega_b,
            omega_k,
            n_nu_rel: 0.0,
            n_nu_mass: 0.0,
            mnu: 0.0,
            w0: -1.0,
            wa: 0.0,
            h,
            norm,
            n_s,
            mgrowth: None,
        })
    }

    /// ΛCDM with curvature and neutrinos.
    #[allow(clippy::too_many_arguments)]
    pub fn lcdm_nu(
        omega_c: f64,
        omega_b: f64,
        omega_k: f64,
        h: f64,
        norm: Normalization,
        n_s: f64,
        n_nu_rel: f64,
        n_nu_mass: f64,
        mnu: f64,
    ) -> Result<Self, CosmoError> {
        Self::derive(&PrimaryParams {
            omega_c,
            omega_b,
            omega_k,
            n_nu_rel,
            n_nu_mass,
            mnu,
            w0: -1.0,
            wa: 0.0,
            h,
            norm,
            n_s,
            mgrowth: None,
        })
    }

    /// Flat wCDM: constant w0 ≠ −1, wa = 0.
    pub fn flat_wcdm(
        omega_c: f64,
        omega_b: f64,
        w0: f64,
        h: f64,
        norm: Normalization,
        n_s: f64,
    ) -> Result<Self, CosmoError> {
        Self::derive(&PrimaryParams {
            omega_c,
            omega_b,
            omega_k: 0.0,
            n_nu_rel: 0.0,
            n_nu_mass: 0.0,
            mnu: 0.0,
            w0,
            wa: 0.0,
            h,
            norm,
            n_s,
            mgrowth: None,
        })
    }

    /// Flat wCDM with neutrinos.
    #[allow(clippy::too_many_arguments)]
    pub fn flat_wcdm_nu(
        omega_c: f64,
        omega_b: f64,
        w0: f64,
        h: f64,
        norm: Normalization,
        n_s: f64,
        n_nu_rel: f64,
        n_nu_mass: f64,
        mnu: f64,
    ) -> Result<Self, CosmoError> {
        Self::derive(&PrimaryParams {
            omega_c,
            omega_b,
            omega_k: 0.0,
            n_nu_rel,
            n_nu_mass,
            mnu,
            w0,
            wa: 0.0,
            h,
            norm,
            n_s,
            mgrowth: None,
        })
    }

    /// Flat w0-wa CDM (time-varying equation of state).
    #[allow(clippy::too_many_arguments)]
    pub fn flat_wacdm(
        omega_c: f64,
        omega_b: f64,
        w0: f64,
        wa: f64,
        h: f64,
        norm: Normalization,
        n_s: f64,
    ) -> Result<Self, CosmoError> {
        Self::derive(&PrimaryParams {
            omega_c,
            omega_b,
            omega_k: 0.0,
            n_nu_rel: 0.0,
            n_nu_mass: 0.0,
            mnu: 0.0,
            w0,
            wa,
            h,
            norm,
            n_s,
            mgrowth: None,
        })
    }

    /// Flat w0-wa CDM with neutrinos.
    #[allow(clippy::too_many_arguments)]
    pub fn flat_wacdm_nu(
        omega_c: f64,
        omega_b: f64,
        w0: f64,
        wa: f64,
        h: f64,
        norm: Normalization,
        n_s: f64,
        n_nu_rel: f64,
        n_nu_mass: f64,
        mnu: f64,
    ) -> Result<Self, CosmoError> {
        Self::derive(&PrimaryParams {
            omega_c,
            omega_b,
            omega_k: 0.0,
            n_nu_rel,
            n_nu_mass,
            mnu,
            w0,
            wa,
            h,
            norm,
            n_s,
            mgrowth: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tolerances::EXACT_F64;

    fn planck_like() -> PrimaryParams {
        PrimaryParams {
            omega_c: 0.25,
            omega_b: 0.05,
            omega_k: 0.0,
            n_nu_rel: 3.046,
            n_nu_mass: 0.0,
            mnu: 0.0,
            w0: -1.0,
            wa: 0.0,
            h: 0.7,
            norm: Normalization::Sigma8(0.8),
            n_s: 0.96,
            mgrowth: None,
        }
    }

    #[test]
    fn closure_holds_by_construction() {
        let params = Parameters::derive(&planck_like()).unwrap();
        assert!(
            (params.density_closure() - 1.0).abs() <= EXACT_F64,
            "closure violated: {}",
            params.density_closure()
        );
    }

    #[test]
    fn closure_holds_with_curvature_and_neutrinos() {
        let mut p = planck_like();
        p.omega_k = 0.05;
        p.n_nu_mass = 3.0;
        p.mnu = 0.3;
        let params = Parameters::derive(&p).unwrap();
        assert!((params.density_closure() - 1.0).abs() <= EXACT_F64);
        assert!(params.omega_n_mass > 0.0);
        assert!(params.omega_l < 0.7, "curvature must eat into Ω_Λ");
    }

    #[test]
    fn derived_fields_match_definitions() {
        let p = planck_like();
        let params = Parameters::derive(&p).unwrap();
        assert!((params.h0 - 70.0).abs() < 1e-12);
        assert_eq!(params.t_cmb, T_CMB);
        assert!(
            (params.omega_m - (p.omega_b + p.omega_c + params.omega_n_mass)).abs() < 1e-15
        );
        assert!(
            (params.omega_n - (params.omega_n_rel + params.omega_n_mass)).abs() < 1e-15
        );
        assert!(params.z_star.is_none(), "z_star reserved, unset");
    }

    #[test]
    fn massless_neutrinos_do_not_enter_matter() {
        let params = Parameters::derive(&planck_like()).unwrap();
        assert_eq!(params.omega_n_mass, 0.0);
        assert!((params.omega_m - 0.30).abs() < 1e-15);
        assert!(params.omega_n_rel > 0.0);
    }

    #[test]
    fn curvature_sign_convention() {
        let flat = Parameters::derive(&planck_like()).unwrap();
        assert_eq!(flat.k_sign, 0);
        assert_eq!(flat.sqrtk, 0.0);

        let mut p = planck_like();
        p.omega_k = 0.1; // open
        let open = Parameters::derive(&p).unwrap();
        assert_eq!(open.k_sign, -1);
        assert!(open.sqrtk > 0.0);

        p.omega_k = -0.1; // closed
        let closed = Parameters::derive(&p).unwrap();
        assert_eq!(closed.k_sign, 1);
    }

    #[test]
    fn normalization_is_exclusive_by_type() {
        let s8 = Parameters::derive(&planck_like()).unwrap();
        assert!(matches!(s8.norm, Normalization::Sigma8(v) if v == 0.8));

        let mut p = planck_like();
        p.norm = Normalization::PrimordialAmplitude(2.215e-9);
        let a_s = Parameters::derive(&p).unwrap();
        assert!(matches!(
            a_s.norm,
            Normalization::PrimordialAmplitude(v) if v == 2.215e-9
        ));
    }

    #[test]
    fn rejects_bad_inputs() {
        let mut p = planck_like();
        p.h = 0.0;
        assert!(Parameters::derive(&p).is_err(), "h = 0");

        let mut p = planck_like();
        p.omega_c = -0.1;
        assert!(Parameters::derive(&p).is_err(), "negative density");

        let mut p = planck_like();
        p.mnu = 0.06;
        p.n_nu_mass = 0.0;
        assert!(Parameters::derive(&p).is_err(), "mass without species");

        let mut p = planck_like();
        p.norm = Normalization::Sigma8(f64::NAN);
        assert!(Parameters::derive(&p).is_err(), "NaN normalization");

        let mut p = planck_like();
        p.mgrowth = Some(GrowthModification {
            z: vec![0.0, 1.0],
            df: vec![0.01],
        });
        assert!(Parameters::derive(&p).is_err(), "mismatched mgrowth");
    }

    #[test]
    fn undersized_mgrowth_is_rejected() {
        // Two matched samples cannot anchor the Δf interpolant; they
        // must be refused outright, never silently truncated.
        let mut p = planck_like();
        p.mgrowth = Some(GrowthModification {
            z: vec![0.0, 1.0],
            df: vec![0.0, 0.5],
        });
        assert!(Parameters::derive(&p).is_err(), "2 samples");

        p.mgrowth = Some(GrowthModification {
            z: vec![0.5],
            df: vec![0.1],
        });
        assert!(Parameters::derive(&p).is_err(), "1 sample");
    }

    #[test]
    fn empty_mgrowth_is_absent() {
        let mut p = planck_like();
        p.mgrowth = Some(GrowthModification {
            z: vec![],
            df: vec![],
        });
        let params = Parameters::derive(&p).unwrap();
        assert!(params.mgrowth.is_none());
    }

    #[test]
    fn mgrowth_is_deep_copied() {
        let mut p = planck_like();
        p.mgrowth = Some(GrowthModification {
            z: vec![0.0, 0.5, 1.0],
            df: vec![0.01, 0.02, 0.03],
        });
        let params = Parameters::derive(&p).unwrap();
        // Mutating the input must not affect the derived record.
        if let Some(mg) = &mut p.mgrowth {
            mg.df[0] = 99.0;
        }
        assert_eq!(params.mgrowth.as_ref().unwrap().df[0], 0.01);
    }

    #[test]
    fn convenience_wrappers_agree_with_base_derivation() {
        let via_wrapper =
            Parameters::flat_lcdm(0.25, 0.05, 0.7, Normalization::Sigma8(0.8), 0.96).unwrap();
        let mut p = planck_like();
        p.n_nu_rel = 0.0;
        let via_base = Parameters::derive(&p).unwrap();
        assert_eq!(via_wrapper.omega_m, via_base.omega_m);
        assert_eq!(via_wrapper.omega_l, via_base.omega_l);
        assert_eq!(via_wrapper.w0, -1.0);
        assert_eq!(via_wrapper.wa, 0.0);

        let wa_model = Parameters::flat_wacdm(
            0.25,
            0.05,
            -0.9,
            0.1,
            0.7,
            Normalization::Sigma8(0.8),
            0.96,
        )
        .unwrap();
        assert_eq!(wa_model.w0, -0.9);
        assert_eq!(wa_model.wa, 0.1);
        assert!((wa_model.density_closure() - 1.0).abs() <= EXACT_F64);
    }
}
