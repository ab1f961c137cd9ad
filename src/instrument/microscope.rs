//! Traveling microscope state.
//!
//! The motion model lives in `motion.rs` and the reading model in
//! `measurement.rs`; both extend [`Microscope`] with further `impl` blocks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};
use super::measurement::{MeasurementRecord, PositionKey};
use super::motion::{HoldRamp, MovementSample, PositionSample};
use super::noise::{NoiseSource, TriangularNoise};
use crate::config::InstrumentParameters;

/// Operating sub-mode of the microscope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InstrumentMode {
    #[default]
    Normal,
    /// Finer steps, lower reading noise, heavier smoothing
    Precision,
}

/// One-dimensional traveling microscope
#[derive(Debug)]
pub struct Microscope {
    pub(super) params: InstrumentParameters,
    /// Stage position (mm), 0 at the ring center
    pub(super) position_mm: f64,
    /// Smoothed stage velocity (mm/s)
    pub(super) velocity_mm_per_sec: f64,
    /// Current step size (mm)
    pub(super) step_mm: f64,
    pub(super) mode: InstrumentMode,
    /// Velocity low-pass coefficient (0-1)
    pub(super) smoothing: f64,
    /// Step size remembered on entering precision mode
    pub(super) normal_step_mm: Option<f64>,
    /// Clock time of the last integration step (s)
    pub(super) last_update_sec: f64,
    pub(super) movement_history: super::History<MovementSample>,
    pub(super) position_history: super::History<PositionSample>,
    pub(super) hold: HoldRamp,
    pub(super) measurements: BTreeMap<PositionKey, MeasurementRecord>,
    pub(super) current_reading: Option<MeasurementRecord>,
    pub(super) clock: Box<dyn Clock>,
    pub(super) noise: Box<dyn NoiseSource>,
}

impl Microscope {
    /// Create a microscope driven by the system clock and triangular noise
    pub fn new(params: InstrumentParameters) -> Self {
        Self::with_sources(
            params,
            Box::new(SystemClock::new()),
            Box::new(TriangularNoise::from_entropy()),
        )
    }

    /// Create a microscope with explicit time and noise sources
    pub fn with_sources(
        params: InstrumentParameters,
        clock: Box<dyn Clock>,
        noise: Box<dyn NoiseSource>,
    ) -> Self {
        let last_update_sec = clock.now_secs();
        Self {
            position_mm: 0.0,
            velocity_mm_per_sec: 0.0,
            step_mm: params.initial_step_mm,
            mode: InstrumentMode::Normal,
            smoothing: params.normal_smoothing,
            normal_step_mm: None,
            last_update_sec,
            movement_history: super::History::new(params.movement_history_len),
            position_history: super::History::new(params.position_history_len),
            hold: HoldRamp::default(),
            measurements: BTreeMap::new(),
            current_reading: None,
            clock,
            noise,
            params,
        }
    }

    pub fn position_mm(&self) -> f64 {
        self.position_mm
    }

    pub fn velocity_mm_per_sec(&self) -> f64 {
        self.velocity_mm_per_sec
    }

    pub fn step_mm(&self) -> f64 {
        self.step_mm
    }

    pub fn mode(&self) -> InstrumentMode {
        self.mode
    }

    pub fn is_precision_mode(&self) -> bool {
        self.mode == InstrumentMode::Precision
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    pub fn max_position_mm(&self) -> f64 {
        self.params.max_position_mm
    }

    pub fn params(&self) -> &InstrumentParameters {
        &self.params
    }

    /// Stored measurements ordered by position
    pub fn measurements(&self) -> &BTreeMap<PositionKey, MeasurementRecord> {
        &self.measurements
    }

    /// Most recent measurement, if any since the last reset
    pub fn current_reading(&self) -> Option<&MeasurementRecord> {
        self.current_reading.as_ref()
    }

    /// Recent movements, oldest first
    pub fn movement_history(&self) -> impl Iterator<Item = &MovementSample> {
        self.movement_history.iter()
    }

    /// Recent stage positions, oldest first
    pub fn position_history(&self) -> impl Iterator<Item = &PositionSample> {
        self.position_history.iter()
    }

    /// Instrument clock time (s)
    pub fn now_secs(&self) -> f64 {
        self.clock.now_secs()
    }

    /// Local time according to the instrument clock
    pub fn wall_clock(&self) -> chrono::DateTime<chrono::Local> {
        self.clock.wall_clock()
    }

    /// Forget all stored measurements
    ///
    /// Position, velocity and step size are kept.
    pub fn reset(&mut self) {
        log::info!(
            "Clearing {} microscope measurements",
            self.measurements.len()
        );
        self.measurements.clear();
        self.current_reading = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::{ManualClock, ZeroNoise};

    fn test_microscope() -> Microscope {
        Microscope::with_sources(
            InstrumentParameters::default(),
            Box::new(ManualClock::new()),
            Box::new(ZeroNoise),
        )
    }

    #[test]
    fn test_initial_state() {
        let scope = test_microscope();
        assert_eq!(scope.position_mm(), 0.0);
        assert_eq!(scope.velocity_mm_per_sec(), 0.0);
        assert!((scope.step_mm() - 0.1).abs() < 1e-12);
        assert_eq!(scope.mode(), InstrumentMode::Normal);
        assert!((scope.smoothing() - 0.8).abs() < 1e-12);
        assert!(scope.measurements().is_empty());
        assert!(scope.current_reading().is_none());
    }
}
