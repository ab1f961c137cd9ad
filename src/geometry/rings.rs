//! Dark-ring radii of the Newton's rings pattern.
//!
//! For reflected light the m-th dark ring sits where the air film thickness
//! t satisfies 2μt = mλ. With t ≈ r²/2R this gives
//!
//! r_m² = m·λ·R / μ
//!
//! Ring 0 is the central dark spot and has zero radius.

use serde::{Deserialize, Serialize};

use crate::config::OpticsParameters;

/// Highest ring order tracked by the simulation
pub const MAX_RINGS: usize = 15;

const NM_PER_MM: f64 = 1e6;
const NM_PER_CM: f64 = 1e7;

/// Radius of the m-th dark ring in mm
///
/// # Arguments
/// * `ring` - Ring order m (0 = central spot)
/// * `wavelength_nm` - Source wavelength (nm)
/// * `radius_of_curvature_nm` - Lens radius of curvature (nm)
/// * `refractive_index` - Film refractive index μ
pub fn ring_radius_mm(
    ring: usize,
    wavelength_nm: f64,
    radius_of_curvature_nm: f64,
    refractive_index: f64,
) -> f64 {
    if ring == 0 {
        return 0.0;
    }
    let radius_nm = (ring as f64 * wavelength_nm * radius_of_curvature_nm / refractive_index).sqrt();
    radius_nm / NM_PER_MM
}

/// Wavelength (nm) implied by a measured ring radius
///
/// Inverse of [`ring_radius_mm`]: λ = r²·μ / (m·R).
/// Returns `None` for the central spot, which carries no wavelength information.
pub fn wavelength_from_ring_nm(
    ring: usize,
    ring_radius_mm: f64,
    radius_of_curvature_cm: f64,
    refractive_index: f64,
) -> Option<f64> {
    if ring == 0 {
        return None;
    }
    let radius_nm = ring_radius_mm * NM_PER_MM;
    let radius_of_curvature_nm = radius_of_curvature_cm * NM_PER_CM;
    Some(radius_nm * radius_nm * refractive_index / (ring as f64 * radius_of_curvature_nm))
}

/// Common laboratory line sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavelengthPreset {
    /// Sodium D line (yellow)
    SodiumD,
    /// Mercury green line
    MercuryGreen,
    /// Hydrogen-beta (blue-green)
    HydrogenBeta,
    /// Hydrogen-alpha (red)
    HydrogenAlpha,
}

impl WavelengthPreset {
    /// All presets in menu order
    pub const ALL: [WavelengthPreset; 4] = [
        WavelengthPreset::SodiumD,
        WavelengthPreset::MercuryGreen,
        WavelengthPreset::HydrogenBeta,
        WavelengthPreset::HydrogenAlpha,
    ];

    /// Line wavelength in nm
    /// Source: NIST Atomic Spectra Database
    pub fn wavelength_nm(self) -> f64 {
        match self {
            WavelengthPreset::SodiumD => 589.3,
            WavelengthPreset::MercuryGreen => 546.1,
            WavelengthPreset::HydrogenBeta => 486.1,
            WavelengthPreset::HydrogenAlpha => 656.3,
        }
    }
}

/// Ring radii (mm) indexed by ring order 0..=MAX_RINGS
///
/// Recomputed as a whole whenever the optics change; never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingTable {
    radii_mm: Vec<f64>,
}

impl RingTable {
    /// Compute the table for the given optics
    pub fn compute(optics: &OpticsParameters) -> Self {
        let radius_of_curvature_nm = optics.radius_of_curvature_nm();
        let radii_mm = (0..=MAX_RINGS)
            .map(|m| {
                ring_radius_mm(
                    m,
                    optics.wavelength_nm,
                    radius_of_curvature_nm,
                    optics.refractive_index,
                )
            })
            .collect();
        Self { radii_mm }
    }

    /// Build a table from explicit radii (mm), ring 0 first
    pub fn from_radii(radii_mm: Vec<f64>) -> Self {
        Self { radii_mm }
    }

    /// Radius of ring `m` in mm
    pub fn radius_mm(&self, ring: usize) -> Option<f64> {
        self.radii_mm.get(ring).copied()
    }

    /// All radii, ring 0 first
    pub fn radii_mm(&self) -> &[f64] {
        &self.radii_mm
    }

    /// Number of entries (including ring 0)
    pub fn len(&self) -> usize {
        self.radii_mm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii_mm.is_empty()
    }

    /// Iterate over (ring order, radius mm)
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.radii_mm.iter().copied().enumerate()
    }
}
