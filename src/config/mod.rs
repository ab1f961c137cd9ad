//! Configuration module for loading simulation parameters.
//!
//! Parameters are read from JSON files when present and fall back to the
//! textbook sodium-lamp setup otherwise.

mod parameters;

pub use parameters::{
    validate_radius_of_curvature_cm, validate_wavelength_nm, InstrumentParameters,
    OpticsParameters, Parameters, MAX_RADIUS_OF_CURVATURE_CM, MAX_WAVELENGTH_NM,
    MIN_RADIUS_OF_CURVATURE_CM, MIN_WAVELENGTH_NM,
};
