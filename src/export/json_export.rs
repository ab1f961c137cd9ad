//! JSON export of a whole session.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use crate::analysis::MeasurementAnalysis;
use crate::config::OpticsParameters;
use crate::instrument::MeasurementRecord;
use crate::state::{CurvatureFit, ExperimentSession, SideMeasurements};

/// Report format version
pub const REPORT_VERSION: &str = "1.0.0";

/// Session snapshot written to JSON
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// Export timestamp
    pub exported_at: String,
    /// Export version for compatibility
    pub version: &'static str,
    pub optics: OpticsParameters,
    /// Readings in ascending position order
    pub measurements: Vec<MeasurementRecord>,
    pub sides: SideMeasurements,
    pub analysis: MeasurementAnalysis,
    /// Absent when fewer than two rings were measured on both sides
    pub curvature_fit: Option<CurvatureFit>,
}

impl SessionReport {
    pub fn from_session(session: &ExperimentSession) -> Self {
        let exported_at = session.microscope().wall_clock().to_rfc3339();
        let curvature_fit = match session.regress_radius_of_curvature() {
            Ok(fit) => Some(fit),
            Err(e) => {
                log::debug!("No curvature fit in report: {}", e);
                None
            }
        };

        Self {
            exported_at,
            version: REPORT_VERSION,
            optics: session.optics().clone(),
            measurements: session.microscope().measurements().values().cloned().collect(),
            sides: session.sides().clone(),
            analysis: session.analyze(),
            curvature_fit,
        }
    }
}

/// Export the session to JSON
///
/// Creates the exports directory if it doesn't exist.
/// Filename is auto-generated with timestamp: `session_YYYYMMDD_HHMMSS.json`
///
/// Returns the path to the saved JSON file.
pub fn export_session_json(session: &ExperimentSession) -> Result<PathBuf> {
    let path = super::timestamped_path("session", "json", Local::now())?;
    export_session_json_to(session, &path)?;
    Ok(path)
}

/// Export the session to a specific file
pub fn export_session_json_to(session: &ExperimentSession, path: &Path) -> Result<()> {
    let report = SessionReport::from_session(session);
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &report)?;

    log::info!("JSON session exported: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Parameters;
    use crate::instrument::{ManualClock, ZeroNoise};

    #[test]
    fn test_report_serializes() {
        let mut session = ExperimentSession::with_sources(
            &Parameters::default(),
            Box::new(ManualClock::new()),
            Box::new(ZeroNoise),
            Box::new(ZeroNoise),
        );
        for ring in [3, 6] {
            session.measure_left_side(ring).unwrap();
            session.measure_right_side(ring).unwrap();
        }

        let report = SessionReport::from_session(&session);
        assert_eq!(report.version, REPORT_VERSION);
        assert!(report.curvature_fit.is_some());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["optics"]["wavelength_nm"], 589.3);
        assert!(json["curvature_fit"]["radius_cm"].as_f64().unwrap() > 99.0);
    }
}
