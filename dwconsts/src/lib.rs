//! Constants shared by the radial tables and the plane-wave kernels.
//!
//! Energies are in Hartree and lengths in bohr unless a name says otherwise.

use std::f64;
use types::c64;

// units : energy

pub const HA_TO_RY: f64 = 2.0;
pub const RY_TO_HA: f64 = 1.0 / HA_TO_RY;

// e^2 in Hartree atomic units, kept explicit in the Coulomb terms

pub const E2: f64 = 1.0;

// step of the uniform q grid of the radial interpolation tables, bohr^-1

pub const DQ: f64 = 0.01;

// complex unit

pub const I_C64: c64 = c64 { re: 0.0, im: 1.0 };

// pi

pub const PI: f64 = f64::consts::PI;
pub const TWOPI: f64 = 2.0 * f64::consts::PI;
pub const FOURPI: f64 = 4.0 * f64::consts::PI;

// numerical convergence

pub const EPS6: f64 = 1E-6;
pub const EPS8: f64 = 1E-8;
pub const EPS16: f64 = 1E-16;
