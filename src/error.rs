// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for parameter derivation and derived-function queries.
//!
//! Public APIs return `Result<_, CosmoError>` so callers can
//! pattern-match on failure modes (bad parameters, quadrature
//! non-convergence, spline construction, root finding) rather than
//! parsing opaque strings. A `Cosmology` additionally records the kind
//! of its first failure as a sticky [`Status`].

use std::fmt;

/// Errors arising from parameter derivation or cache population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CosmoError {
    /// Invalid or inconsistent primary parameters.
    Parameters(String),

    /// A quadrature or ODE driver failed to reach its tolerance.
    Integration(String),

    /// Spline construction failed (too few or non-monotone samples).
    Spline(String),

    /// A root-finding iteration failed to converge.
    Root(String),

    /// Query outside the tabulated domain (a, k, R or χ out of range).
    OutOfRange(String),

    /// Parameter file loading failed (path, underlying IO or parse error).
    DataLoad(String),
}

impl fmt::Display for CosmoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameters(msg) => write!(f, "Invalid parameters: {msg}"),
            Self::Integration(msg) => write!(f, "Integration failed: {msg}"),
            Self::Spline(msg) => write!(f, "Spline construction failed: {msg}"),
            Self::Root(msg) => write!(f, "Root finding failed: {msg}"),
            Self::OutOfRange(msg) => write!(f, "Out of tabulated range: {msg}"),
            Self::DataLoad(msg) => write!(f, "Data loading failed: {msg}"),
        }
    }
}

impl std::error::Error for CosmoError {}

/// Sticky overall status of a `Cosmology`.
///
/// Set to the kind of the first detected failure and never cleared;
/// cache slots that populated successfully remain usable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// No failure recorded.
    #[default]
    Ok,
    Parameters,
    Integration,
    Spline,
    Root,
    OutOfRange,
    DataLoad,
}

impl Status {
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<&CosmoError> for Status {
    fn from(e: &CosmoError) -> Self {
        match e {
            CosmoError::Parameters(_) => Self::Parameters,
            CosmoError::Integration(_) => Self::Integration,
            CosmoError::Spline(_) => Self::Spline,
            CosmoError::Root(_) => Self::Root,
            CosmoError::OutOfRange(_) => Self::OutOfRange,
            CosmoError::DataLoad(_) => Self::DataLoad,
        }
    }
}
