//! Session state.
//!
//! The session owns everything that lives for one run of the experiment.

mod session;

pub use session::{CurvatureFit, ExperimentSession, MeasurementSink, SideMeasurements};
