//! Reading model of the traveling microscope.
//!
//! A measurement locates the ring nearest the crosshair, estimates how well
//! the crosshair is aligned with it, and produces a noisy reading whose noise
//! shrinks with alignment and in precision mode.
//!
//! | Ring misalignment | Noise scale |
//! |-------------------|-------------|
//! | < 0.001 mm        | ×0.01       |
//! | < 0.01 mm         | ×0.1        |
//! | < 0.1 mm          | ×0.2        |
//! | otherwise         | ×1.0        |

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::microscope::{InstrumentMode, Microscope};
use crate::geometry::RingTable;

/// Noise reduction in precision mode
const PRECISION_NOISE_FACTOR: f64 = 0.1;
/// Position keys resolve 1e-9 mm
const KEY_UNITS_PER_MM: f64 = 1e9;

/// Measurement quality, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MeasurementQuality {
    Standard,
    Good,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
    #[serde(rename = "Ultra-High")]
    UltraHigh,
}

impl MeasurementQuality {
    /// Best first
    pub const DESCENDING: [MeasurementQuality; 5] = [
        MeasurementQuality::UltraHigh,
        MeasurementQuality::VeryHigh,
        MeasurementQuality::High,
        MeasurementQuality::Good,
        MeasurementQuality::Standard,
    ];

    /// Classify from ring misalignment (mm) and stage speed (mm/s)
    ///
    /// Both must be under the threshold; the first matching tier wins.
    pub fn classify(distance_mm: f64, velocity_mm_per_sec: f64) -> Self {
        let speed = velocity_mm_per_sec.abs();
        if distance_mm < 0.001 && speed < 0.001 {
            MeasurementQuality::UltraHigh
        } else if distance_mm < 0.01 && speed < 0.01 {
            MeasurementQuality::VeryHigh
        } else if distance_mm < 0.05 && speed < 0.05 {
            MeasurementQuality::High
        } else if distance_mm < 0.1 && speed < 0.1 {
            MeasurementQuality::Good
        } else {
            MeasurementQuality::Standard
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MeasurementQuality::UltraHigh => "Ultra-High",
            MeasurementQuality::VeryHigh => "Very High",
            MeasurementQuality::High => "High",
            MeasurementQuality::Good => "Good",
            MeasurementQuality::Standard => "Standard",
        }
    }

    /// Statistical tier: 0 for Good and Standard, up to 3 for Ultra-High
    pub fn tier_index(self) -> usize {
        match self {
            MeasurementQuality::UltraHigh => 3,
            MeasurementQuality::VeryHigh => 2,
            MeasurementQuality::High => 1,
            MeasurementQuality::Good | MeasurementQuality::Standard => 0,
        }
    }

    /// Weight in the precision-weighted mean
    pub fn weight(self) -> f64 {
        (self.tier_index() + 1) as f64
    }
}

impl std::fmt::Display for MeasurementQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Side of the ring center a reading was taken on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Negative positions are on the left; the center counts as right
    pub fn of_position(position_mm: f64) -> Self {
        if position_mm < 0.0 {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// Measurement map key: position rounded to 9 decimals of a millimetre
///
/// Readings closer than 1e-9 mm share a key and replace one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionKey(i64);

impl PositionKey {
    pub fn from_position_mm(position_mm: f64) -> Self {
        PositionKey((position_mm * KEY_UNITS_PER_MM).round() as i64)
    }

    /// Rounded position (mm)
    pub fn position_mm(self) -> f64 {
        self.0 as f64 / KEY_UNITS_PER_MM
    }
}

/// One microscope reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// True stage position (mm)
    pub position_mm: f64,
    /// Ring order nearest the crosshair
    pub closest_ring: usize,
    /// Runner-up ring order
    pub second_closest_ring: Option<usize>,
    /// Distance between |position| and the closest ring radius (mm)
    pub distance_from_ring_mm: f64,
    /// Position as read off the scale, noise included (mm)
    pub reading_mm: f64,
    pub quality: MeasurementQuality,
    /// Stage speed at the time of the reading (mm/s)
    pub velocity_mm_per_sec: f64,
    /// Noise amplitude applied to this reading (mm)
    pub noise_estimate_mm: f64,
    /// 100 = crosshair on the ring, 99 = 0.01 mm or more off
    pub alignment_quality_percent: f64,
    /// Instrument clock time (s)
    pub time_sec: f64,
    pub taken_at: DateTime<Local>,
}

impl MeasurementRecord {
    pub fn side(&self) -> Side {
        Side::of_position(self.position_mm)
    }

    pub fn key(&self) -> PositionKey {
        PositionKey::from_position_mm(self.position_mm)
    }
}

/// Noise multiplier for a given ring misalignment (mm)
pub fn alignment_noise_scale(distance_mm: f64) -> f64 {
    if distance_mm < 0.001 {
        0.01
    } else if distance_mm < 0.01 {
        0.1
    } else if distance_mm < 0.1 {
        0.2
    } else {
        1.0
    }
}

/// Alignment score in percent; bottoms out at 99 from 0.01 mm misalignment
pub fn alignment_quality_percent(distance_mm: f64) -> f64 {
    100.0 - (distance_mm * 100.0).min(1.0)
}

/// Closest and second-closest ring to a radial distance
///
/// Ties go to the lower ring order.
pub fn nearest_rings(radial_mm: f64, rings: &RingTable) -> (usize, Option<usize>, f64) {
    let mut closest = 0;
    let mut min_distance = f64::INFINITY;
    let mut second = None;
    let mut second_distance = f64::INFINITY;

    for (ring, radius_mm) in rings.iter() {
        let distance = (radial_mm - radius_mm).abs();
        if distance < min_distance {
            if min_distance.is_finite() {
                second = Some(closest);
                second_distance = min_distance;
            }
            min_distance = distance;
            closest = ring;
        } else if distance < second_distance {
            second_distance = distance;
            second = Some(ring);
        }
    }

    (closest, second, min_distance)
}

impl Microscope {
    /// Take a reading at the current stage position
    ///
    /// The record is stored (keyed by rounded position), becomes the current
    /// reading, and is returned.
    pub fn take_measurement(&mut self, rings: &RingTable) -> MeasurementRecord {
        let position_mm = self.position_mm;
        let (closest_ring, second_closest_ring, distance_mm) =
            nearest_rings(position_mm.abs(), rings);

        let mut base_noise_mm = self.params.base_noise_mm;
        if self.mode == InstrumentMode::Precision {
            base_noise_mm *= PRECISION_NOISE_FACTOR;
        }
        let noise_estimate_mm = base_noise_mm * alignment_noise_scale(distance_mm);
        let noise_mm = self.noise.sample() * noise_estimate_mm;

        let velocity_mm_per_sec = self.instantaneous_velocity();
        let quality = MeasurementQuality::classify(distance_mm, velocity_mm_per_sec);

        let record = MeasurementRecord {
            position_mm,
            closest_ring,
            second_closest_ring,
            distance_from_ring_mm: distance_mm,
            reading_mm: position_mm + noise_mm,
            quality,
            velocity_mm_per_sec,
            noise_estimate_mm,
            alignment_quality_percent: alignment_quality_percent(distance_mm),
            time_sec: self.clock.now_secs(),
            taken_at: self.clock.wall_clock(),
        };

        log::debug!(
            "Measurement at {:.6} mm: ring {} ({:.6} mm off), {}",
            position_mm,
            closest_ring,
            distance_mm,
            quality
        );

        self.measurements.insert(record.key(), record.clone());
        self.current_reading = Some(record.clone());
        record
    }

    /// Finite-difference speed over the two newest position samples
    pub fn instantaneous_velocity(&self) -> f64 {
        match self.position_history.last_pair() {
            Some((older, newer)) => {
                let dt = newer.time_sec - older.time_sec;
                if dt > 0.0 {
                    (newer.position_mm - older.position_mm) / dt
                } else {
                    0.0
                }
            }
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_thresholds() {
        assert_eq!(MeasurementQuality::classify(0.0, 0.0), MeasurementQuality::UltraHigh);
        assert_eq!(MeasurementQuality::classify(0.0005, 0.005), MeasurementQuality::VeryHigh);
        assert_eq!(MeasurementQuality::classify(0.02, 0.0), MeasurementQuality::High);
        assert_eq!(MeasurementQuality::classify(0.07, -0.07), MeasurementQuality::Good);
        assert_eq!(MeasurementQuality::classify(0.0, 0.2), MeasurementQuality::Standard);
        assert_eq!(MeasurementQuality::classify(0.5, 0.0), MeasurementQuality::Standard);
    }

    #[test]
    fn test_quality_order_and_weights() {
        assert!(MeasurementQuality::UltraHigh > MeasurementQuality::VeryHigh);
        assert!(MeasurementQuality::Good > MeasurementQuality::Standard);
        assert_eq!(MeasurementQuality::UltraHigh.weight(), 4.0);
        assert_eq!(MeasurementQuality::Good.weight(), 1.0);
        assert_eq!(MeasurementQuality::Standard.weight(), 1.0);
    }

    #[test]
    fn test_quality_labels_serialize() {
        let json = serde_json::to_string(&MeasurementQuality::VeryHigh).unwrap();
        assert_eq!(json, "\"Very High\"");
        assert_eq!(MeasurementQuality::UltraHigh.to_string(), "Ultra-High");
    }

    #[test]
    fn test_alignment_quality_saturates() {
        assert_eq!(alignment_quality_percent(0.0), 100.0);
        assert!((alignment_quality_percent(0.005) - 99.5).abs() < 1e-9);
        assert_eq!(alignment_quality_percent(0.01), 99.0);
        assert_eq!(alignment_quality_percent(0.5), 99.0);
        assert_eq!(alignment_quality_percent(3.0), 99.0);
    }

    #[test]
    fn test_noise_scale_tiers() {
        assert_eq!(alignment_noise_scale(0.0005), 0.01);
        assert_eq!(alignment_noise_scale(0.005), 0.1);
        assert_eq!(alignment_noise_scale(0.05), 0.2);
        assert_eq!(alignment_noise_scale(0.5), 1.0);
    }

    #[test]
    fn test_nearest_rings_ties_go_low() {
        let rings = RingTable::from_radii(vec![0.0, 1.0, 2.0]);
        let (closest, second, distance) = nearest_rings(0.5, &rings);
        assert_eq!(closest, 0);
        assert_eq!(second, Some(1));
        assert!((distance - 0.5).abs() < 1e-12);

        let (closest, second, _) = nearest_rings(1.9, &rings);
        assert_eq!(closest, 2);
        assert_eq!(second, Some(1));
    }

    #[test]
    fn test_position_key_rounding() {
        let a = PositionKey::from_position_mm(0.5);
        let b = PositionKey::from_position_mm(0.5 + 1e-10);
        let c = PositionKey::from_position_mm(0.5 + 2e-9);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!((a.position_mm() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_side_of_center_is_right() {
        assert_eq!(Side::of_position(-0.1), Side::Left);
        assert_eq!(Side::of_position(0.0), Side::Right);
    }
}
