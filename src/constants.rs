// SPDX-License-Identifier: AGPL-3.0-only

//! Physical constants and sampling configuration.
//!
//! Density parameters are expressed in natural units where the critical
//! density today is `RHO_CRIT_EV4 * h^2` in eV⁴; temperatures convert
//! between Kelvin and eV through `K_PER_EV`.

/// CMB temperature today [K] (FIRAS).
pub const T_CMB: f64 = 2.7255;

/// Kelvin per electron-volt.
pub const K_PER_EV: f64 = 11604.5;

/// Critical density divided by h² in eV⁴ (natural units).
pub const RHO_CRIT_EV4: f64 = 8.098e-11;

/// Ratio of the effective non-relativistic neutrino temperature to `T_CMB`.
///
/// Chosen so that a fully non-relativistic species satisfies
/// Σm_ν / (Ω_ν h²) = 93.14 eV, matching the CLASS convention for
/// non-cold relics (instantaneous-decoupling value would be (4/11)^⅓).
pub const TNCDM: f64 = 0.71611;

/// Speed of light divided by 100 km/s, in Mpc. `c/H0 = CLIGHT_HMPC / h` Mpc.
pub const CLIGHT_HMPC: f64 = 2997.92458;

/// Pivot scale of the primordial power spectrum [1/Mpc].
pub const K_PIVOT: f64 = 0.05;

// ═══════════════════════════════════════════════════════════════════
// Sampling configuration for the lazily-built splines
// ═══════════════════════════════════════════════════════════════════

/// Smallest scale factor tabulated by the background splines (z = 9).
pub const A_SPLINE_MIN: f64 = 0.1;
/// Largest scale factor tabulated (today).
pub const A_SPLINE_MAX: f64 = 1.0;
/// Number of scale-factor samples.
pub const A_SPLINE_NA: usize = 1000;

/// Grid spacing of the inverse-distance a(χ) table [Mpc].
pub const CHI_SPACING_MPC: f64 = 5.0;

/// Scale factor below which the growth ODE is replaced by the
/// matter-dominated solution D = a, f = 1 (also the integration start).
pub const GROWTH_A_INIT: f64 = 1e-6;

/// Wavenumber range of the power-spectrum spline [1/Mpc].
pub const K_MIN: f64 = 1e-4;
pub const K_MAX: f64 = 1e3;
/// Number of log-spaced wavenumber samples.
pub const N_K: usize = 500;

/// Radius range of the σ(R) spline [Mpc].
pub const SIGMA_R_MIN: f64 = 0.1;
pub const SIGMA_R_MAX: f64 = 100.0;
/// Number of log-spaced radius samples.
pub const N_SIGMA_R: usize = 100;

/// Reduced mass/temperature domain of the neutrino phase-space table.
///
/// Below `NU_MNUT_MIN` the species is fully relativistic, above
/// `NU_MNUT_MAX` fully non-relativistic; evaluation outside the domain
/// clamps to the corresponding asymptote.
pub const NU_MNUT_MIN: f64 = 1e-4;
pub const NU_MNUT_MAX: f64 = 500.0;
/// Number of log-spaced samples of the phase-space table.
pub const NU_MNUT_N: usize = 1000;

/// Upper cutoff of the dimensionless phase-space momentum integral.
///
/// The Fermi-Dirac tail beyond x = 60 is suppressed by e⁻⁶⁰ ≈ 9e-27,
/// over nineteen orders below the quadrature tolerance, and eˣ stays
/// far from f64 overflow (which hits at x ≈ 709.8).
pub const NU_MOMENTUM_CUT: f64 = 60.0;
