//! Parameter structures for the optics bench and the traveling microscope.
//!
//! Optical parameters are the ones a student changes between runs; the
//! instrument parameters describe the microscope hardware and rarely change.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SimResult, SimulationError};

/// Lower bound of the accepted wavelength range (nm, exclusive)
pub const MIN_WAVELENGTH_NM: f64 = 400.0;
/// Upper bound of the accepted wavelength range (nm, inclusive)
pub const MAX_WAVELENGTH_NM: f64 = 700.0;
/// Lower bound of the accepted radius of curvature (cm)
pub const MIN_RADIUS_OF_CURVATURE_CM: f64 = 50.0;
/// Upper bound of the accepted radius of curvature (cm)
pub const MAX_RADIUS_OF_CURVATURE_CM: f64 = 200.0;

/// Top-level parameters container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameters {
    /// Light source and lens parameters
    pub optics: OpticsParameters,
    /// Traveling microscope parameters
    pub instrument: InstrumentParameters,
}

impl Parameters {
    /// Load parameters from JSON files, or use defaults if files don't exist
    pub fn load_or_default() -> Self {
        Self::load_from_dir("data/parameters")
    }

    /// Load parameters from specific directory
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let optics = load_json_or_default::<OpticsParameters>(dir.join("optics.json"), "optics");
        let instrument =
            load_json_or_default::<InstrumentParameters>(dir.join("instrument.json"), "instrument");

        let optics = match optics.validate() {
            Ok(()) => optics,
            Err(e) => {
                log::warn!("Invalid optics parameters: {}, using defaults", e);
                OpticsParameters::default()
            }
        };

        Self { optics, instrument }
    }
}

fn load_json_or_default<T>(path: impl AsRef<Path>, label: &str) -> T
where
    T: Default + for<'de> Deserialize<'de>,
{
    match std::fs::read_to_string(path.as_ref()) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(params) => {
                log::info!("Loaded {} parameters from {:?}", label, path.as_ref());
                params
            }
            Err(e) => {
                log::warn!("Failed to parse {} parameters: {}, using defaults", label, e);
                T::default()
            }
        },
        Err(_) => {
            log::info!("{} parameters file not found, using defaults", label);
            T::default()
        }
    }
}

/// Light source and lens parameters
///
/// Ring radii follow r² = mλR/μ for the m-th dark ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpticsParameters {
    /// Wavelength of the monochromatic source (nm)
    /// Reference: sodium D line, 589.3 nm
    /// Source: NIST Atomic Spectra Database
    pub wavelength_nm: f64,

    /// Radius of curvature of the plano-convex lens (cm)
    pub radius_of_curvature_cm: f64,

    /// Refractive index of the film between lens and plate
    /// Air film in this setup
    pub refractive_index: f64,
}

impl OpticsParameters {
    /// Radius of curvature converted to nm
    pub fn radius_of_curvature_nm(&self) -> f64 {
        self.radius_of_curvature_cm * 1e7
    }

    /// Check that wavelength and radius are inside the accepted ranges
    pub fn validate(&self) -> SimResult<()> {
        validate_wavelength_nm(self.wavelength_nm)?;
        validate_radius_of_curvature_cm(self.radius_of_curvature_cm)?;
        Ok(())
    }
}

impl Default for OpticsParameters {
    fn default() -> Self {
        Self {
            wavelength_nm: 589.3,
            radius_of_curvature_cm: 100.0,
            refractive_index: 1.0,
        }
    }
}

/// Accept wavelengths in (400, 700] nm
pub fn validate_wavelength_nm(wavelength_nm: f64) -> SimResult<()> {
    if wavelength_nm > MIN_WAVELENGTH_NM && wavelength_nm <= MAX_WAVELENGTH_NM {
        Ok(())
    } else {
        Err(SimulationError::out_of_range(
            "wavelength (nm)",
            wavelength_nm,
            MIN_WAVELENGTH_NM,
            MAX_WAVELENGTH_NM,
        ))
    }
}

/// Accept radii of curvature in [50, 200] cm
pub fn validate_radius_of_curvature_cm(radius_cm: f64) -> SimResult<()> {
    if (MIN_RADIUS_OF_CURVATURE_CM..=MAX_RADIUS_OF_CURVATURE_CM).contains(&radius_cm) {
        Ok(())
    } else {
        Err(SimulationError::out_of_range(
            "radius of curvature (cm)",
            radius_cm,
            MIN_RADIUS_OF_CURVATURE_CM,
            MAX_RADIUS_OF_CURVATURE_CM,
        ))
    }
}

/// Traveling microscope parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentParameters {
    /// Travel limit on either side of the center (mm)
    pub max_position_mm: f64,
    /// Step size at power-on (mm)
    pub initial_step_mm: f64,
    /// Smallest selectable step (mm)
    pub min_step_mm: f64,
    /// Largest selectable step (mm)
    pub max_step_mm: f64,
    /// Velocity smoothing in normal mode (0-1, higher = more inertia)
    pub normal_smoothing: f64,
    /// Velocity smoothing in precision mode
    pub precision_smoothing: f64,
    /// Longest time step the motion integrator accepts (s)
    pub max_dt_sec: f64,
    /// Velocity multiplier applied when a move is refused at the travel limit
    pub boundary_damping: f64,
    /// Reading noise amplitude before alignment scaling (mm)
    pub base_noise_mm: f64,
    /// Capacity of the movement history used by the motion indicator
    pub movement_history_len: usize,
    /// Capacity of the position samples used for instantaneous velocity
    pub position_history_len: usize,
}

impl Default for InstrumentParameters {
    fn default() -> Self {
        Self {
            max_position_mm: 30.0,
            initial_step_mm: 0.1,
            min_step_mm: 0.001,
            max_step_mm: 2.0,
            normal_smoothing: 0.8,
            precision_smoothing: 0.9,
            max_dt_sec: 0.1,
            boundary_damping: 0.5,
            base_noise_mm: 0.01,
            movement_history_len: 15,
            position_history_len: 20,
        }
    }
}
