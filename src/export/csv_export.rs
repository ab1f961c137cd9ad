//! CSV export of microscope readings.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use crate::instrument::MeasurementRecord;

use super::timestamped_path;

/// One CSV row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementCsvRecord {
    /// Local time of the reading (RFC 3339)
    pub taken_at: String,
    /// Instrument clock time (s)
    pub time_sec: f64,
    /// True stage position (mm)
    pub position_mm: f64,
    /// Scale reading, noise included (mm)
    pub reading_mm: f64,
    pub closest_ring: usize,
    /// Empty when the table has a single ring
    pub second_closest_ring: Option<usize>,
    pub distance_from_ring_mm: f64,
    pub quality: &'static str,
    pub velocity_mm_per_sec: f64,
    pub noise_estimate_mm: f64,
    pub alignment_quality_percent: f64,
}

impl From<&MeasurementRecord> for MeasurementCsvRecord {
    fn from(r: &MeasurementRecord) -> Self {
        Self {
            taken_at: r.taken_at.to_rfc3339(),
            time_sec: r.time_sec,
            position_mm: r.position_mm,
            reading_mm: r.reading_mm,
            closest_ring: r.closest_ring,
            second_closest_ring: r.second_closest_ring,
            distance_from_ring_mm: r.distance_from_ring_mm,
            quality: r.quality.label(),
            velocity_mm_per_sec: r.velocity_mm_per_sec,
            noise_estimate_mm: r.noise_estimate_mm,
            alignment_quality_percent: r.alignment_quality_percent,
        }
    }
}

/// Streaming CSV writer for readings
pub struct CsvExporter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl CsvExporter<File> {
    /// Create `exports/measurements_YYYYMMDD_HHMMSS.csv`
    pub fn create() -> Result<(Self, PathBuf)> {
        let path = timestamped_path("measurements", "csv", Local::now())?;
        let exporter = Self::create_at(&path)?;
        Ok((exporter, path))
    }

    /// Create (or truncate) a CSV file at `path`
    pub fn create_at(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        log::info!("CSV export started: {}", path.display());
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> CsvExporter<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            rows: 0,
        }
    }

    pub fn record(&mut self, record: &MeasurementRecord) -> Result<()> {
        self.writer.serialize(MeasurementCsvRecord::from(record))?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the underlying writer
    pub fn finish(self) -> Result<W> {
        let rows = self.rows;
        let inner = self
            .writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flushing CSV writer: {}", e.error()))?;
        log::info!("CSV export completed: {} rows", rows);
        Ok(inner)
    }
}

/// Write readings as CSV into any writer
pub fn write_measurements_csv<'a, W: Write>(
    records: impl IntoIterator<Item = &'a MeasurementRecord>,
    writer: W,
) -> Result<W> {
    let mut exporter = CsvExporter::from_writer(writer);
    for record in records {
        exporter.record(record)?;
    }
    exporter.finish()
}

/// Export readings to an auto-named file in `exports/`
///
/// Returns the path to the saved CSV file.
pub fn export_measurements_csv<'a>(
    records: impl IntoIterator<Item = &'a MeasurementRecord>,
) -> Result<PathBuf> {
    let (mut exporter, path) = CsvExporter::create()?;
    for record in records {
        exporter.record(record)?;
    }
    exporter.finish()?;
    Ok(path)
}

/// Export readings to a specific file
pub fn export_measurements_csv_to<'a>(
    records: impl IntoIterator<Item = &'a MeasurementRecord>,
    path: &Path,
) -> Result<()> {
    let file = File::create(path)?;
    write_measurements_csv(records, file)?;
    log::info!("CSV measurements exported: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::MeasurementQuality;

    fn record(position_mm: f64, quality: MeasurementQuality) -> MeasurementRecord {
        MeasurementRecord {
            position_mm,
            closest_ring: 2,
            second_closest_ring: Some(1),
            distance_from_ring_mm: 0.0005,
            reading_mm: position_mm + 0.0001,
            quality,
            velocity_mm_per_sec: 0.0,
            noise_estimate_mm: 0.0001,
            alignment_quality_percent: 95.0,
            time_sec: 1.5,
            taken_at: Local::now(),
        }
    }

    #[test]
    fn test_header_and_rows() {
        let records = [
            record(-1.0857, MeasurementQuality::UltraHigh),
            record(1.0857, MeasurementQuality::VeryHigh),
        ];
        let bytes = write_measurements_csv(records.iter(), Vec::new()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("taken_at,time_sec,position_mm,reading_mm,closest_ring"));
        assert!(lines[1].contains("Ultra-High"));
        assert!(lines[2].contains("Very High"));
    }

    #[test]
    fn test_missing_second_ring_is_empty_field() {
        let mut r = record(0.5, MeasurementQuality::Good);
        r.second_closest_ring = None;
        let row = MeasurementCsvRecord::from(&r);
        assert_eq!(row.second_closest_ring, None);
        assert_eq!(row.quality, "Good");
    }
}
