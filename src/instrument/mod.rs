//! Virtual traveling microscope.
//!
//! The instrument has:
//! - a smoothed one-dimensional stage with hard travel limits
//! - normal and precision sub-modes (finer steps, heavier smoothing, less noise)
//! - a reading model with alignment-dependent triangular noise
//! - bounded movement and position histories
//!
//! Time and randomness are injected through [`Clock`] and [`NoiseSource`] so
//! that runs can be replayed exactly.

pub mod clock;
pub mod history;
pub mod measurement;
pub mod microscope;
pub mod motion;
pub mod noise;

pub use clock::{Clock, ManualClock, SystemClock};
pub use history::History;
pub use measurement::{
    alignment_noise_scale, alignment_quality_percent, nearest_rings, MeasurementQuality,
    MeasurementRecord, PositionKey, Side,
};
pub use microscope::{InstrumentMode, Microscope};
pub use motion::{
    step_down_mm, step_up_mm, Direction, HoldRamp, MotionIndicator, MoveOutcome, MovementSample,
    PositionSample, SpeedClass,
};
pub use noise::{NoiseSource, TriangularNoise, UniformNoise, ZeroNoise};
