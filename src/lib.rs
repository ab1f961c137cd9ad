//! Newton's Rings Simulator - virtual traveling-microscope measurement engine
//!
//! This library models the interference rings between a plano-convex lens
//! and a flat plate, a traveling microscope used to read ring edges, and the
//! analysis that turns those readings into wavelength and curvature estimates.

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod instrument;
pub mod state;

pub use analysis::{analyze_measurements, MeasurementAnalysis, RingAnalysis, WavelengthStatistics};
pub use config::{InstrumentParameters, OpticsParameters, Parameters};
pub use error::{SimResult, SimulationError};
pub use geometry::{RingTable, WavelengthPreset, MAX_RINGS};
pub use instrument::{
    Direction, InstrumentMode, ManualClock, MeasurementQuality, MeasurementRecord, Microscope,
    Side,
};
pub use state::{CurvatureFit, ExperimentSession, SideMeasurements};
