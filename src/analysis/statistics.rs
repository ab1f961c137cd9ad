//! Cross-ring wavelength statistics.

use serde::{Deserialize, Serialize};

use crate::instrument::MeasurementQuality;

/// Summary of the per-ring wavelength estimates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavelengthStatistics {
    pub ring_count: usize,
    /// Simple mean (nm)
    pub mean_nm: f64,
    /// Mean weighted by quality tier + 1 (nm)
    pub weighted_mean_nm: f64,
    pub min_nm: f64,
    pub max_nm: f64,
    /// Population standard deviation (nm)
    pub std_dev_nm: f64,
    pub coefficient_of_variation_percent: f64,
    /// |weighted mean − reference| / reference
    pub weighted_error_percent: f64,
}

/// Relative error in percent
pub fn error_percent(estimate: f64, reference: f64) -> f64 {
    (estimate - reference).abs() / reference * 100.0
}

/// Statistics over (wavelength nm, quality) pairs; `None` when empty
pub fn wavelength_statistics(
    estimates: &[(f64, MeasurementQuality)],
    reference_nm: f64,
) -> Option<WavelengthStatistics> {
    if estimates.is_empty() {
        return None;
    }

    let n = estimates.len() as f64;
    let mean_nm = estimates.iter().map(|(w, _)| w).sum::<f64>() / n;
    let min_nm = estimates.iter().map(|(w, _)| *w).fold(f64::INFINITY, f64::min);
    let max_nm = estimates.iter().map(|(w, _)| *w).fold(f64::NEG_INFINITY, f64::max);
    let variance = estimates.iter().map(|(w, _)| (w - mean_nm).powi(2)).sum::<f64>() / n;
    let std_dev_nm = variance.sqrt();

    let total_weight: f64 = estimates.iter().map(|(_, q)| q.weight()).sum();
    let weighted_mean_nm = estimates.iter().map(|(w, q)| w * q.weight()).sum::<f64>() / total_weight;

    let coefficient_of_variation_percent = if mean_nm != 0.0 {
        100.0 * std_dev_nm / mean_nm
    } else {
        0.0
    };

    Some(WavelengthStatistics {
        ring_count: estimates.len(),
        mean_nm,
        weighted_mean_nm,
        min_nm,
        max_nm,
        std_dev_nm,
        coefficient_of_variation_percent,
        weighted_error_percent: error_percent(weighted_mean_nm, reference_nm),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_statistics() {
        assert!(wavelength_statistics(&[], 589.3).is_none());
    }

    #[test]
    fn test_mean_and_population_std() {
        let estimates = [
            (580.0, MeasurementQuality::Standard),
            (590.0, MeasurementQuality::Standard),
            (600.0, MeasurementQuality::Standard),
        ];
        let stats = wavelength_statistics(&estimates, 590.0).unwrap();
        assert!((stats.mean_nm - 590.0).abs() < 1e-9);
        assert!((stats.std_dev_nm - (200.0_f64 / 3.0).sqrt()).abs() < 1e-9);
        assert_eq!(stats.min_nm, 580.0);
        assert_eq!(stats.max_nm, 600.0);
        // Equal weights reduce to the simple mean
        assert!((stats.weighted_mean_nm - stats.mean_nm).abs() < 1e-9);
    }

    #[test]
    fn test_weighting_favors_high_quality() {
        let estimates = [
            (589.0, MeasurementQuality::UltraHigh),
            (599.0, MeasurementQuality::Standard),
        ];
        let stats = wavelength_statistics(&estimates, 589.3).unwrap();
        // (4·589 + 1·599) / 5
        assert!((stats.weighted_mean_nm - 591.0).abs() < 1e-9);
        assert!((stats.mean_nm - 594.0).abs() < 1e-9);
        assert!(stats.weighted_error_percent < error_percent(stats.mean_nm, 589.3));
    }
}
