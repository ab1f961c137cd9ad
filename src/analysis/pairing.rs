//! Per-ring grouping and best-pair selection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::instrument::{MeasurementQuality, MeasurementRecord, Side};

/// One reading reduced to what pairing needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RingSample {
    pub position_mm: f64,
    pub quality: MeasurementQuality,
}

/// Readings of one ring, split by side
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RingSamples {
    pub left: Vec<RingSample>,
    pub right: Vec<RingSample>,
}

impl RingSamples {
    pub fn is_complete(&self) -> bool {
        !self.left.is_empty() && !self.right.is_empty()
    }

    /// Number of readings of `quality` on each side as (left, right)
    pub fn count(&self, quality: MeasurementQuality) -> (usize, usize) {
        let count = |samples: &[RingSample]| samples.iter().filter(|s| s.quality == quality).count();
        (count(self.left.as_slice()), count(self.right.as_slice()))
    }

    /// Smallest and largest diameter over every left × right pairing
    ///
    /// `None` unless there is more than one pairing.
    pub fn diameter_range_mm(&self) -> Option<(f64, f64)> {
        if self.left.len() * self.right.len() < 2 {
            return None;
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for l in &self.left {
            for r in &self.right {
                let d = r.position_mm - l.position_mm;
                min = min.min(d);
                max = max.max(d);
            }
        }
        Some((min, max))
    }
}

/// Edge positions chosen to represent a ring
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BestPair {
    pub left_mm: f64,
    pub right_mm: f64,
    /// Quality tier both edges were taken from
    pub quality: MeasurementQuality,
}

impl BestPair {
    pub fn diameter_mm(&self) -> f64 {
        self.right_mm - self.left_mm
    }
}

/// Group readings by closest ring, dropping the central spot
pub fn group_by_ring<'a>(
    records: impl IntoIterator<Item = &'a MeasurementRecord>,
) -> BTreeMap<usize, RingSamples> {
    let mut groups: BTreeMap<usize, RingSamples> = BTreeMap::new();
    for record in records {
        if record.closest_ring == 0 {
            continue;
        }
        let sample = RingSample {
            position_mm: record.position_mm,
            quality: record.quality,
        };
        let entry = groups.entry(record.closest_ring).or_default();
        match record.side() {
            Side::Left => entry.left.push(sample),
            Side::Right => entry.right.push(sample),
        }
    }
    groups
}

fn innermost(samples: &[RingSample], quality: Option<MeasurementQuality>, side: Side) -> Option<f64> {
    let positions = samples
        .iter()
        .filter(|s| quality.map_or(true, |q| s.quality == q))
        .map(|s| s.position_mm);
    match side {
        Side::Left => positions.reduce(f64::max),
        Side::Right => positions.reduce(f64::min),
    }
}

/// Pick the edges used for a ring's diameter
///
/// The best quality tier present on both sides is used. Within it the
/// rightmost left edge and the leftmost right edge are taken, which gives the
/// smallest diameter. Without a shared tier all readings are used and the
/// pair is reported as Standard.
pub fn select_best_pair(samples: &RingSamples) -> Option<BestPair> {
    if !samples.is_complete() {
        return None;
    }

    for quality in MeasurementQuality::DESCENDING {
        let left = innermost(&samples.left, Some(quality), Side::Left);
        let right = innermost(&samples.right, Some(quality), Side::Right);
        if let (Some(left_mm), Some(right_mm)) = (left, right) {
            return Some(BestPair {
                left_mm,
                right_mm,
                quality,
            });
        }
    }

    Some(BestPair {
        left_mm: innermost(&samples.left, None, Side::Left)?,
        right_mm: innermost(&samples.right, None, Side::Right)?,
        quality: MeasurementQuality::Standard,
    })
}
