// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized numerical tolerances with justification.
//!
//! Every tolerance used by the solvers and by the validation tests is
//! defined here with its origin. No ad-hoc magic numbers.

/// Tolerance for operations that should be exact in f64 arithmetic.
///
/// The density closure Ω_m + Ω_γ + Ω_ν,rel + Ω_k + Ω_Λ = 1 holds by
/// construction (Ω_Λ is the closure term); 1e-10 allows a few digits of
/// rounding in the summation order.
pub const EXACT_F64: f64 = 1e-10;

/// Relative tolerance of the comoving-distance quadrature.
///
/// The χ(a) integrand c/(a²E) is smooth over [a, 1]; 1e-6 keeps the
/// spline-sampling error dominant over the quadrature error.
pub const DIST_EPSREL: f64 = 1e-6;

/// Relative tolerance of the growth ODE driver (Cash–Karp RK45).
pub const GROWTH_EPSREL: f64 = 1e-6;

/// Relative tolerance of the neutrino phase-space momentum integral.
///
/// The table is normalized by its relativistic edge, so only relative
/// accuracy matters; 1e-7 leaves the interpolation error dominant.
pub const NU_PHASESPACE_EPSREL: f64 = 1e-7;

/// Relative tolerance of the top-hat σ(R) integral.
pub const SIGMA_EPSREL: f64 = 1e-7;

/// Relative tolerance of the Gaussian-window σ(R) integrals used by
/// halofit. Tighter than `SIGMA_EPSREL` because the spectral curvature
/// combines three of these integrals with near-cancellation.
pub const HALOFIT_SIGMA_EPSREL: f64 = 1e-9;

/// Relative interval tolerance of the Brent search for the nonlinear
/// scale σ_G(R) = 1.
pub const HALOFIT_ROOT_EPSREL: f64 = 1e-5;

/// Absolute step tolerance of the Newton iteration inverting χ(a).
///
/// 1e-6 in scale factor corresponds to sub-0.05 Mpc in distance over
/// the tabulated range.
pub const ACHI_NEWTON_EPSABS: f64 = 1e-6;

// ═══════════════════════════════════════════════════════════════════
// Validation-test tolerances
// ═══════════════════════════════════════════════════════════════════

/// Massless-neutrino density from the table versus the closed form.
///
/// Bounded by the phase-space quadrature (1e-7) plus the spline
/// interpolation error at the relativistic edge.
pub const MASSLESS_NU_TOLERANCE: f64 = 1e-5;

/// Background spline evaluation versus the closed-form E(a).
///
/// Natural cubic spline over 1000 samples of a smooth function:
/// interpolation error O(Δa⁴) ≈ 1e-12; 1e-6 is conservative.
pub const SPLINE_VS_CLOSED_FORM: f64 = 1e-6;

/// σ8 recovered from a spectrum normalized to a requested σ8.
///
/// Round trip through the k-grid spline and two σ integrals; 1e-3
/// relative allows the finite k-range truncation.
pub const SIGMA8_ROUND_TRIP: f64 = 1e-3;
