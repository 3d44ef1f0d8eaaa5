// SPDX-License-Identifier: AGPL-3.0-only

//! CPU numerical kernels backing the derived-function splines.
//!
//! Provides the four capabilities the cosmology core consumes:
//! adaptive quadrature ([`quad`]), an adaptive Cash–Karp RK45 driver
//! ([`ode`]), bracketing/Newton root finders ([`root`]), and natural
//! cubic splines with a stateful lookup accelerator ([`spline`]).

pub mod ode;
pub mod quad;
pub mod root;
pub mod spline;

pub use ode::rk45_drive;
pub use quad::integrate;
pub use root::{brent, newton};
pub use spline::{Accel, Spline};
