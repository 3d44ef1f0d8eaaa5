// SPDX-License-Identifier: AGPL-3.0-only

//! The cosmological model object and its derived-quantity caches.
//!
//! A [`Cosmology`] owns an immutable [`Parameters`] record plus a set
//! of write-once cache slots for the expensive derived functions
//! (background splines, growth, linear power, σ(R), halofit). Each
//! slot is `None` until its compute routine fills it; `is_some()` IS
//! the computed flag, so flag and payload can never disagree. Queries
//! populate the slots they need on demand and reuse them afterwards.
//!
//! The first failure of any compute or query records its kind as a
//! sticky [`Status`]; already-populated slots stay usable.

use crate::error::{CosmoError, Status};
use crate::halofit::Halofit;
use crate::numerics::{Accel, Spline};
use crate::params::{Parameters, PrimaryParams};

/// Lazily-populated derived quantities.
///
/// Splines are keyed as noted; the `Accel` cursors are evaluation
/// state, not model state, and carry no physical meaning.
#[derive(Debug, Clone, Default)]
pub(crate) struct DerivedData {
    /// E(a) = H(a)/H0 over the scale-factor grid.
    pub e: Option<Spline>,
    /// Comoving radial distance χ(a) [Mpc].
    pub chi: Option<Spline>,
    /// Inverse distance relation a(χ).
    pub achi: Option<Spline>,
    /// Normalized growth factor D(a), D(1) = 1.
    pub growth: Option<Spline>,
    /// Growth rate f(a) = dln D / dln a.
    pub fgrowth: Option<Spline>,
    /// Unnormalized ODE growth at a = 1, set together with `growth`.
    pub growth0: f64,
    /// ln P_lin(ln k) at a = 1.
    pub log_p_lin: Option<Spline>,
    /// ln σ(ln R) at a = 1.
    pub log_sigma: Option<Spline>,
    /// Halofit coefficients, cached at the first queried epoch.
    pub halofit: Option<Halofit>,

    /// Cursor for the a-indexed background and growth splines.
    pub accel: Accel,
    /// Cursor for the χ-indexed inverse distance spline.
    pub accel_achi: Accel,
    /// Cursor for the ln k-indexed power spline.
    pub accel_k: Accel,
}

/// A cosmological model: parameters plus cached derived functions.
#[derive(Debug, Clone)]
pub struct Cosmology {
    pub params: Parameters,
    pub(crate) data: DerivedData,
    status: Status,
}

impl Cosmology {
    /// Create a model with all caches empty. Cheap; no integration
    /// happens until a derived function is queried.
    #[must_use]
    pub fn new(params: Parameters) -> Self {
        Self {
            params,
            data: DerivedData::default(),
            status: Status::Ok,
        }
    }

    /// Derive parameters and create the model in one step.
    ///
    /// # Errors
    ///
    /// `CosmoError::Parameters` if validation fails.
    pub fn from_primary(primary: &PrimaryParams) -> Result<Self, CosmoError> {
        Ok(Self::new(Parameters::derive(primary)?))
    }

    /// Sticky status: the kind of the first failure, or `Ok`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether the background splines (E, χ, a(χ)) are populated.
    #[must_use]
    pub fn computed_distances(&self) -> bool {
        self.data.chi.is_some()
    }

    /// Whether the growth splines are populated.
    #[must_use]
    pub fn computed_growth(&self) -> bool {
        self.data.growth.is_some()
    }

    /// Whether the linear power spline is populated.
    #[must_use]
    pub fn computed_power(&self) -> bool {
        self.data.log_p_lin.is_some()
    }

    /// Whether the σ(R) spline is populated.
    #[must_use]
    pub fn computed_sigma(&self) -> bool {
        self.data.log_sigma.is_some()
    }

    /// Whether halofit coefficients are cached.
    #[must_use]
    pub fn computed_halofit(&self) -> bool {
        self.data.halofit.is_some()
    }

    /// Record the kind of the first failure, then pass the result on.
    pub(crate) fn sticky<T>(&mut self, res: Result<T, CosmoError>) -> Result<T, CosmoError> {
        if let Err(e) = &res {
            if self.status.is_ok() {
                self.status = Status::from(e);
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Normalization;

    fn model() -> Cosmology {
        Cosmology::new(
            Parameters::flat_lcdm(0.25, 0.05, 0.7, Normalization::Sigma8(0.8), 0.96).unwrap(),
        )
    }

    #[test]
    fn new_model_has_empty_caches() {
        let cosmo = model();
        assert!(cosmo.status().is_ok());
        assert!(!cosmo.computed_distances());
        assert!(!cosmo.computed_growth());
        assert!(!cosmo.computed_power());
        assert!(!cosmo.computed_sigma());
        assert!(!cosmo.computed_halofit());
    }

    #[test]
    fn sticky_status_keeps_first_failure() {
        let mut cosmo = model();
        let _ = cosmo.sticky::<()>(Err(CosmoError::OutOfRange("a = 1.5".into())));
        assert_eq!(cosmo.status(), Status::OutOfRange);
        // A later failure of a different kind must not overwrite it.
        let _ = cosmo.sticky::<()>(Err(CosmoError::Root("lost bracket".into())));
        assert_eq!(cosmo.status(), Status::OutOfRange);
    }

    #[test]
    fn sticky_passes_ok_through_untouched() {
        let mut cosmo = model();
        let v = cosmo.sticky(Ok(42)).unwrap();
        assert_eq!(v, 42);
        assert!(cosmo.status().is_ok());
    }
}
