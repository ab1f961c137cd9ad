//! Export of measurement data.
//!
//! Provides a CSV table of microscope readings and a JSON session report.
//! Files land in `exports/` with a timestamped name unless a path is given.

mod csv_export;
mod json_export;

pub use csv_export::{
    export_measurements_csv, export_measurements_csv_to, write_measurements_csv, CsvExporter,
    MeasurementCsvRecord,
};
pub use json_export::{export_session_json, export_session_json_to, SessionReport};

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local};

/// Directory for auto-named export files
pub const EXPORT_DIR: &str = "exports";

/// Path `exports/<prefix>_YYYYMMDD_HHMMSS.<extension>`, creating the directory
fn timestamped_path(prefix: &str, extension: &str, at: DateTime<Local>) -> Result<PathBuf> {
    let dir = PathBuf::from(EXPORT_DIR);
    std::fs::create_dir_all(&dir)?;
    let filename = format!("{}_{}.{}", prefix, at.format("%Y%m%d_%H%M%S"), extension);
    Ok(dir.join(filename))
}
