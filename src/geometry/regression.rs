//! Least-squares estimate of the lens radius of curvature.
//!
//! The dark-ring diameters satisfy D_n² = 4·n·λ·R/μ, so a straight-line fit of
//! D² against ring number has slope 4λR/μ. The intercept absorbs any constant
//! offset (dust under the lens, an unknown fringe order) and is discarded.

use crate::error::{SimResult, SimulationError};

/// Minimum number of complete rings needed for a fit
pub const MIN_REGRESSION_RINGS: usize = 2;

const MM2_PER_CM2: f64 = 100.0;
const CM_PER_NM: f64 = 1e-7;

/// Ordinary least-squares slope of y against x
///
/// slope = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²)
pub fn least_squares_slope(x: &[f64], y: &[f64]) -> SimResult<f64> {
    if x.len() != y.len() {
        return Err(SimulationError::SampleLengthMismatch {
            rings: x.len(),
            diameters: y.len(),
        });
    }
    if x.len() < MIN_REGRESSION_RINGS {
        return Err(SimulationError::InsufficientData {
            required: MIN_REGRESSION_RINGS,
            available: x.len(),
        });
    }

    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return Err(SimulationError::DegenerateRegression);
    }

    Ok((n * sum_xy - sum_x * sum_y) / denominator)
}

/// Radius of curvature (cm) from ring numbers and squared diameters (mm²)
///
/// # Arguments
/// * `rings` - Ring orders of the complete measurements
/// * `diameters_squared_mm2` - D² for each ring (mm²)
/// * `wavelength_nm` - Source wavelength (nm)
///
/// Air film is assumed (μ = 1).
pub fn regress_radius_of_curvature_cm(
    rings: &[usize],
    diameters_squared_mm2: &[f64],
    wavelength_nm: f64,
) -> SimResult<f64> {
    let x: Vec<f64> = rings.iter().map(|&m| m as f64).collect();
    let slope_mm2 = least_squares_slope(&x, diameters_squared_mm2)?;

    let slope_cm2 = slope_mm2 / MM2_PER_CM2;
    let radius_cm = slope_cm2 / (4.0 * wavelength_nm * CM_PER_NM);

    log::debug!(
        "Regression over {} rings: slope={:.6} mm²/ring, R={:.3} cm",
        rings.len(),
        slope_mm2,
        radius_cm
    );
    Ok(radius_cm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ring_radius_mm;

    #[test]
    fn test_slope_of_exact_line() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [3.0, 5.0, 7.0, 9.0];
        let slope = least_squares_slope(&x, &y).unwrap();
        assert!((slope - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_ring_is_insufficient() {
        let err = regress_radius_of_curvature_cm(&[3], &[1.0], 589.3).unwrap_err();
        assert_eq!(
            err,
            SimulationError::InsufficientData {
                required: 2,
                available: 1
            }
        );
    }

    #[test]
    fn test_repeated_ring_is_degenerate() {
        let err = regress_radius_of_curvature_cm(&[4, 4], &[1.0, 1.1], 589.3).unwrap_err();
        assert_eq!(err, SimulationError::DegenerateRegression);
    }

    #[test]
    fn test_length_mismatch() {
        let err = regress_radius_of_curvature_cm(&[1, 2, 3], &[1.0, 2.0], 589.3).unwrap_err();
        assert!(matches!(err, SimulationError::SampleLengthMismatch { .. }));
    }

    #[test]
    fn test_offset_does_not_bias_radius() {
        let rings = [3usize, 6, 9];
        let d2: Vec<f64> = rings
            .iter()
            .map(|&m| (2.0 * ring_radius_mm(m, 546.1, 1.5e9, 1.0)).powi(2) + 0.05)
            .collect();
        let radius = regress_radius_of_curvature_cm(&rings, &d2, 546.1).unwrap();
        assert!((radius - 150.0).abs() / 150.0 < 1e-6);
    }
}
