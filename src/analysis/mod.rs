//! Measurement analysis: ring diameters and wavelength estimates.
//!
//! ## Pipeline
//! 1. Group stored readings by closest ring (ring 0 is skipped)
//! 2. For rings read on both sides, pick the best edge pair
//! 3. D = x_right − x_left, r = D/2, λ = r²μ / (mR)
//! 4. Mean, spread and quality-weighted mean across rings
//!
//! Weights are quality tier + 1, so an Ultra-High ring counts four times as
//! much as a Standard one.

pub mod pairing;
pub mod statistics;

pub use pairing::{group_by_ring, select_best_pair, BestPair, RingSample, RingSamples};
pub use statistics::{error_percent, wavelength_statistics, WavelengthStatistics};

use serde::{Deserialize, Serialize};

use crate::config::OpticsParameters;
use crate::geometry::wavelength_from_ring_nm;
use crate::instrument::{MeasurementQuality, MeasurementRecord};

/// Number of readings of one quality on each side of a ring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityCount {
    pub quality: MeasurementQuality,
    pub left: usize,
    pub right: usize,
}

/// Result for one ring read on both sides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingAnalysis {
    pub ring: usize,
    pub left_position_mm: f64,
    pub right_position_mm: f64,
    pub diameter_mm: f64,
    pub diameter_squared_mm2: f64,
    pub wavelength_nm: f64,
    /// Error of `wavelength_nm` against the configured source (%)
    pub wavelength_error_percent: f64,
    /// Tier the edge pair was taken from
    pub quality: MeasurementQuality,
    /// Only tiers with at least one reading, best first
    pub quality_counts: Vec<QualityCount>,
    /// Spread of diameters over all edge pairings
    pub diameter_range_mm: Option<(f64, f64)>,
}

/// Full analysis of the stored readings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementAnalysis {
    /// Complete rings in ascending order
    pub rings: Vec<RingAnalysis>,
    pub statistics: Option<WavelengthStatistics>,
}

impl MeasurementAnalysis {
    pub fn ring(&self, ring: usize) -> Option<&RingAnalysis> {
        self.rings.iter().find(|r| r.ring == ring)
    }
}

/// Analyze readings against the optics they were taken with
pub fn analyze_measurements<'a>(
    records: impl IntoIterator<Item = &'a MeasurementRecord>,
    optics: &OpticsParameters,
) -> MeasurementAnalysis {
    let groups = group_by_ring(records);
    let mut rings = Vec::new();

    for (ring, samples) in &groups {
        let pair = match select_best_pair(samples) {
            Some(pair) => pair,
            None => continue,
        };

        let diameter_mm = pair.diameter_mm();
        let wavelength_nm = match wavelength_from_ring_nm(
            *ring,
            diameter_mm / 2.0,
            optics.radius_of_curvature_cm,
            optics.refractive_index,
        ) {
            Some(w) => w,
            None => continue,
        };

        let quality_counts = MeasurementQuality::DESCENDING
            .iter()
            .filter_map(|&quality| {
                let (left, right) = samples.count(quality);
                (left + right > 0).then_some(QualityCount {
                    quality,
                    left,
                    right,
                })
            })
            .collect();

        rings.push(RingAnalysis {
            ring: *ring,
            left_position_mm: pair.left_mm,
            right_position_mm: pair.right_mm,
            diameter_mm,
            diameter_squared_mm2: diameter_mm * diameter_mm,
            wavelength_nm,
            wavelength_error_percent: error_percent(wavelength_nm, optics.wavelength_nm),
            quality: pair.quality,
            quality_counts,
            diameter_range_mm: samples.diameter_range_mm(),
        });
    }

    let estimates: Vec<(f64, MeasurementQuality)> =
        rings.iter().map(|r| (r.wavelength_nm, r.quality)).collect();
    let statistics = wavelength_statistics(&estimates, optics.wavelength_nm);

    if let Some(stats) = &statistics {
        log::info!(
            "Analyzed {} rings: weighted λ = {:.3} nm ({:.3}% error)",
            stats.ring_count,
            stats.weighted_mean_nm,
            stats.weighted_error_percent
        );
    }

    MeasurementAnalysis { rings, statistics }
}
