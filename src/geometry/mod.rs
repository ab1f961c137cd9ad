//! Interference ring geometry.
//!
//! Forward model (ring order → radius), its inverse (radius → wavelength) and
//! the curvature regression used to back out the lens radius from diameters.

pub mod regression;
pub mod rings;

pub use regression::{least_squares_slope, regress_radius_of_curvature_cm, MIN_REGRESSION_RINGS};
pub use rings::{ring_radius_mm, wavelength_from_ring_nm, RingTable, WavelengthPreset, MAX_RINGS};
