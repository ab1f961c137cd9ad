//! Experiment session: the owning context of one simulation run.
//!
//! The session holds the optics, the ring table derived from them, the
//! microscope, and the left/right edge positions used for the curvature fit.
//! The microscope knows nothing about the session; after every reading the
//! session forwards the record to its [`MeasurementSink`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::{analyze_measurements, error_percent, MeasurementAnalysis};
use crate::config::{
    validate_radius_of_curvature_cm, validate_wavelength_nm, OpticsParameters, Parameters,
};
use crate::error::{SimResult, SimulationError};
use crate::geometry::{regress_radius_of_curvature_cm, RingTable, WavelengthPreset, MAX_RINGS};
use crate::instrument::{
    Clock, Direction, MeasurementRecord, Microscope, MoveOutcome, NoiseSource, Side,
    SystemClock, TriangularNoise, UniformNoise,
};

/// Half-width of the error added to directly entered edge positions (mm)
const DIRECT_ENTRY_NOISE_MM: f64 = 0.01;

/// Receiver of microscope readings
pub trait MeasurementSink {
    fn record_measurement(&mut self, record: &MeasurementRecord);
}

/// Edge positions per ring, one map for each side of the center
///
/// Later entries for a ring replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideMeasurements {
    left: BTreeMap<usize, f64>,
    right: BTreeMap<usize, f64>,
}

impl SideMeasurements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, side: Side, ring: usize, position_mm: f64) {
        match side {
            Side::Left => self.left.insert(ring, position_mm),
            Side::Right => self.right.insert(ring, position_mm),
        };
    }

    pub fn get(&self, side: Side, ring: usize) -> Option<f64> {
        match side {
            Side::Left => self.left.get(&ring).copied(),
            Side::Right => self.right.get(&ring).copied(),
        }
    }

    pub fn left(&self) -> &BTreeMap<usize, f64> {
        &self.left
    }

    pub fn right(&self) -> &BTreeMap<usize, f64> {
        &self.right
    }

    /// Rings measured on both sides as (ring, left mm, right mm), ascending
    pub fn complete_rings(&self) -> Vec<(usize, f64, f64)> {
        self.left
            .iter()
            .filter_map(|(&ring, &left)| self.right.get(&ring).map(|&right| (ring, left, right)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    pub fn clear(&mut self) {
        self.left.clear();
        self.right.clear();
    }
}

impl MeasurementSink for SideMeasurements {
    /// Readings on the central spot are ignored; the raw stage position is stored
    fn record_measurement(&mut self, record: &MeasurementRecord) {
        if record.closest_ring > 0 {
            self.insert(record.side(), record.closest_ring, record.position_mm);
        }
    }
}

/// Radius of curvature recovered from ring diameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvatureFit {
    pub rings: Vec<usize>,
    pub diameters_mm: Vec<f64>,
    pub diameters_squared_mm2: Vec<f64>,
    /// Fitted radius of curvature (cm)
    pub radius_cm: f64,
    /// Configured radius of curvature (cm)
    pub actual_radius_cm: f64,
    pub error_percent: f64,
}

impl CurvatureFit {
    /// Fit the rings present in both side maps
    pub fn from_sides(sides: &SideMeasurements, optics: &OpticsParameters) -> SimResult<Self> {
        let complete = sides.complete_rings();
        let rings: Vec<usize> = complete.iter().map(|&(ring, _, _)| ring).collect();
        let diameters_mm: Vec<f64> = complete
            .iter()
            .map(|&(_, left, right)| (right - left).abs())
            .collect();
        let diameters_squared_mm2: Vec<f64> = diameters_mm.iter().map(|d| d * d).collect();

        let radius_cm =
            regress_radius_of_curvature_cm(&rings, &diameters_squared_mm2, optics.wavelength_nm)?;

        Ok(Self {
            rings,
            diameters_mm,
            diameters_squared_mm2,
            radius_cm,
            actual_radius_cm: optics.radius_of_curvature_cm,
            error_percent: error_percent(radius_cm, optics.radius_of_curvature_cm),
        })
    }
}

/// One run of the experiment
#[derive(Debug)]
pub struct ExperimentSession {
    optics: OpticsParameters,
    rings: RingTable,
    microscope: Microscope,
    sides: SideMeasurements,
    entry_noise: Box<dyn NoiseSource>,
}

impl ExperimentSession {
    /// Create a session on the system clock with entropy-seeded noise
    pub fn new(params: &Parameters) -> Self {
        Self::with_sources(
            params,
            Box::new(SystemClock::new()),
            Box::new(TriangularNoise::from_entropy()),
            Box::new(UniformNoise::from_entropy()),
        )
    }

    /// Create a session with explicit clock and noise sources
    ///
    /// `reading_noise` drives the microscope; `entry_noise` perturbs directly
    /// entered edge positions.
    pub fn with_sources(
        params: &Parameters,
        clock: Box<dyn Clock>,
        reading_noise: Box<dyn NoiseSource>,
        entry_noise: Box<dyn NoiseSource>,
    ) -> Self {
        let optics = params.optics.clone();
        let rings = RingTable::compute(&optics);
        let microscope = Microscope::with_sources(params.instrument.clone(), clock, reading_noise);

        log::info!(
            "Session created: λ = {:.1} nm, R = {:.1} cm, ring 1 at {:.4} mm",
            optics.wavelength_nm,
            optics.radius_of_curvature_cm,
            rings.radius_mm(1).unwrap_or(0.0)
        );

        Self {
            optics,
            rings,
            microscope,
            sides: SideMeasurements::new(),
            entry_noise,
        }
    }

    pub fn optics(&self) -> &OpticsParameters {
        &self.optics
    }

    pub fn ring_table(&self) -> &RingTable {
        &self.rings
    }

    pub fn microscope(&self) -> &Microscope {
        &self.microscope
    }

    /// Direct access for step size, precision mode and hold controls
    pub fn microscope_mut(&mut self) -> &mut Microscope {
        &mut self.microscope
    }

    pub fn sides(&self) -> &SideMeasurements {
        &self.sides
    }

    /// Change wavelength and/or radius of curvature and recompute the rings
    ///
    /// Both values are checked before either is applied, so a rejected call
    /// leaves the session unchanged.
    pub fn set_physical_parameters(
        &mut self,
        wavelength_nm: Option<f64>,
        radius_of_curvature_cm: Option<f64>,
    ) -> SimResult<&RingTable> {
        if let Some(wavelength_nm) = wavelength_nm {
            validate_wavelength_nm(wavelength_nm)?;
        }
        if let Some(radius_cm) = radius_of_curvature_cm {
            validate_radius_of_curvature_cm(radius_cm)?;
        }

        if let Some(wavelength_nm) = wavelength_nm {
            self.optics.wavelength_nm = wavelength_nm;
        }
        if let Some(radius_cm) = radius_of_curvature_cm {
            self.optics.radius_of_curvature_cm = radius_cm;
        }
        self.rings = RingTable::compute(&self.optics);

        log::info!(
            "Optics set to λ = {:.1} nm, R = {:.1} cm",
            self.optics.wavelength_nm,
            self.optics.radius_of_curvature_cm
        );
        Ok(&self.rings)
    }

    /// Switch to a standard line source
    pub fn set_wavelength_preset(&mut self, preset: WavelengthPreset) -> &RingTable {
        self.optics.wavelength_nm = preset.wavelength_nm();
        self.rings = RingTable::compute(&self.optics);
        log::info!("Source set to {:?} ({:.1} nm)", preset, self.optics.wavelength_nm);
        &self.rings
    }

    pub fn move_microscope(&mut self, direction: Direction, factor: f64) -> MoveOutcome {
        self.microscope.move_toward(direction, factor)
    }

    /// Read the microscope and sync the edge maps
    pub fn take_measurement(&mut self) -> MeasurementRecord {
        let record = self.microscope.take_measurement(&self.rings);
        self.sides.record_measurement(&record);
        record
    }

    /// Enter a known edge position for a ring
    pub fn enter_measurement(&mut self, side: Side, ring: usize, position_mm: f64) -> SimResult<()> {
        check_ring(ring)?;
        self.sides.insert(side, ring, position_mm);
        Ok(())
    }

    /// Record the left edge of `ring` from the ring table plus entry noise
    pub fn measure_left_side(&mut self, ring: usize) -> SimResult<f64> {
        self.measure_side(Side::Left, ring)
    }

    /// Record the right edge of `ring` from the ring table plus entry noise
    pub fn measure_right_side(&mut self, ring: usize) -> SimResult<f64> {
        self.measure_side(Side::Right, ring)
    }

    fn measure_side(&mut self, side: Side, ring: usize) -> SimResult<f64> {
        check_ring(ring)?;
        let radius_mm = self
            .rings
            .radius_mm(ring)
            .ok_or_else(|| SimulationError::out_of_range("ring", ring as f64, 1.0, MAX_RINGS as f64))?;
        let edge_mm = match side {
            Side::Left => -radius_mm,
            Side::Right => radius_mm,
        };
        let position_mm = edge_mm + self.entry_noise.sample() * DIRECT_ENTRY_NOISE_MM;
        self.sides.insert(side, ring, position_mm);
        log::debug!("Entered {:?} edge of ring {} at {:.4} mm", side, ring, position_mm);
        Ok(position_mm)
    }

    /// Analyze every stored microscope reading
    pub fn analyze(&self) -> MeasurementAnalysis {
        analyze_measurements(self.microscope.measurements().values(), &self.optics)
    }

    /// Replace the edge maps' entries with the analysis' selected pairs
    pub fn apply_best_pairs(&mut self, analysis: &MeasurementAnalysis) {
        for ring in &analysis.rings {
            self.sides.insert(Side::Left, ring.ring, ring.left_position_mm);
            self.sides.insert(Side::Right, ring.ring, ring.right_position_mm);
        }
    }

    /// Fit the radius of curvature from the edge maps
    pub fn regress_radius_of_curvature(&self) -> SimResult<CurvatureFit> {
        let fit = CurvatureFit::from_sides(&self.sides, &self.optics)?;
        log::info!(
            "Fitted R = {:.2} cm from {} rings ({:.2}% error)",
            fit.radius_cm,
            fit.rings.len(),
            fit.error_percent
        );
        Ok(fit)
    }

    /// Clear the microscope's stored readings only
    pub fn reset_instrument(&mut self) {
        self.microscope.reset();
    }

    /// Clear microscope readings and both edge maps
    pub fn reset_all_measurements(&mut self) {
        self.microscope.reset();
        self.sides.clear();
        log::info!("All measurements reset");
    }
}

fn check_ring(ring: usize) -> SimResult<()> {
    if (1..=MAX_RINGS).contains(&ring) {
        Ok(())
    } else {
        Err(SimulationError::out_of_range(
            "ring",
            ring as f64,
            1.0,
            MAX_RINGS as f64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::{ManualClock, ZeroNoise};

    fn quiet_session() -> ExperimentSession {
        ExperimentSession::with_sources(
            &Parameters::default(),
            Box::new(ManualClock::new()),
            Box::new(ZeroNoise),
            Box::new(ZeroNoise),
        )
    }

    #[test]
    fn test_complete_rings_need_both_sides() {
        let mut sides = SideMeasurements::new();
        sides.insert(Side::Left, 2, -1.0);
        sides.insert(Side::Right, 2, 1.0);
        sides.insert(Side::Left, 3, -1.3);
        assert_eq!(sides.complete_rings(), vec![(2, -1.0, 1.0)]);
    }

    #[test]
    fn test_direct_entry_without_noise_hits_ring_edges() {
        let mut session = quiet_session();
        let left = session.measure_left_side(4).unwrap();
        let right = session.measure_right_side(4).unwrap();
        let r4 = session.ring_table().radius_mm(4).unwrap();
        assert_eq!(left, -r4);
        assert_eq!(right, r4);
    }

    #[test]
    fn test_direct_entry_rejects_bad_ring() {
        let mut session = quiet_session();
        assert!(matches!(
            session.measure_left_side(0),
            Err(SimulationError::InputOutOfRange { .. })
        ));
        assert!(session.measure_right_side(MAX_RINGS + 1).is_err());
        assert!(session.sides().is_empty());
    }

    #[test]
    fn test_rejected_parameters_leave_state() {
        let mut session = quiet_session();
        let before = session.ring_table().clone();
        let err = session.set_physical_parameters(Some(546.1), Some(500.0));
        assert!(err.is_err());
        assert_eq!(session.optics().wavelength_nm, 589.3);
        assert_eq!(session.ring_table(), &before);
    }

    #[test]
    fn test_center_reading_not_synced() {
        let mut session = quiet_session();
        let record = session.take_measurement();
        assert_eq!(record.closest_ring, 0);
        assert!(session.sides().is_empty());
    }
}
