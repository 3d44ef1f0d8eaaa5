// SPDX-License-Identifier: AGPL-3.0-only

//! deepfield: cosmological-model evaluation.
//!
//! A [`Cosmology`] bundles a validated, immutable parameter record with
//! lazily-built caches for the expensive derived functions of a
//! Friedmann model:
//!
//! - background: expansion rate E(a), comoving radial and angular
//!   distances, luminosity distance, and the inverse relation a(χ)
//! - linear growth: D(a) normalized to 1 today, growth rate f(a), with
//!   optional tabulated Δf(z) modifications
//! - linear matter power: BBKS transfer function normalized by either
//!   the primordial amplitude A_s or by σ8, plus σ(R)
//! - nonlinear matter power: Takahashi-revision halofit
//!
//! Massive neutrinos enter through the relativistic phase-space
//! integral, tabulated once per process ([`PhaseSpaceTable`]) and
//! shared by every parameter derivation. Dark energy closes the
//! density budget, so Ω totals 1 by construction.
//!
//! ```no_run
//! use deepfield::{Cosmology, Normalization, Parameters};
//!
//! # fn main() -> Result<(), deepfield::CosmoError> {
//! let params = Parameters::flat_lcdm(0.25, 0.05, 0.7, Normalization::Sigma8(0.8), 0.96)?;
//! let mut cosmo = Cosmology::new(params);
//! let chi = cosmo.comoving_radial_distance(0.5)?; // z = 1, in Mpc
//! let pk = cosmo.linear_matter_power(0.1, 1.0)?;
//! println!("chi(z=1) = {chi:.1} Mpc, P(0.1) = {pk:.1} Mpc^3");
//! # Ok(())
//! # }
//! ```
//!
//! Caches populate on first use and are write-once; queries outside
//! the tabulated domains fail with [`CosmoError::OutOfRange`] and set
//! the sticky [`Status`] without poisoning populated caches.

pub mod background;
pub mod constants;
pub mod cosmology;
pub mod data;
pub mod error;
pub mod halofit;
pub mod neutrinos;
pub mod numerics;
pub mod params;
pub mod power;
pub mod tolerances;

pub use background::{h_over_h0, omega_x, Species};
pub use cosmology::Cosmology;
pub use data::load_params;
pub use error::{CosmoError, Status};
pub use neutrinos::{omega_nu_h2, PhaseSpaceTable};
pub use params::{GrowthModification, Normalization, Parameters, PrimaryParams};
pub use power::tsqr_bbks;
