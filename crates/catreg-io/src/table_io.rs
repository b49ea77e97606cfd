//! Histogram tables and JSON records for transforms and reports.

use anyhow::{Context, Result};
use catreg_core::spatial::Matrix4;
use catreg_core::RigidTransform;
use catreg_registration::{CatheterRegistrationReport, DistanceHistogram};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct HistogramRow {
    #[serde(rename = "Bin lower")]
    lower: f64,
    #[serde(rename = "Bin upper")]
    upper: f64,
    // Written as a float column.
    #[serde(rename = "Frequencies")]
    frequency: f64,
}

/// Write one CSV row per histogram bin.
pub fn write_histogram_csv<P: AsRef<Path>>(path: P, histogram: &DistanceHistogram) -> Result<()> {
    let path = path.as_ref();
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    for bin in &histogram.bins {
        writer.serialize(HistogramRow {
            lower: bin.lower,
            upper: bin.upper,
            frequency: bin.frequency as f64,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a histogram table back as `(lower, upper, frequency)` rows.
pub fn read_histogram_csv<P: AsRef<Path>>(path: P) -> Result<Vec<(f64, f64, f64)>> {
    let path = path.as_ref();
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("Failed to open {}", path.display()))?;
    reader
        .deserialize::<HistogramRow>()
        .map(|row| {
            let row = row.with_context(|| format!("Malformed histogram row in {}", path.display()))?;
            Ok((row.lower, row.upper, row.frequency))
        })
        .collect()
}

/// On-disk form of a transform: the homogeneous matrix plus readable parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    /// Row-major 4x4 matrix mapping reconstructed into segmented coordinates.
    pub matrix: [[f64; 4]; 4],
    #[serde(default)]
    pub translation: [f64; 3],
    #[serde(default)]
    pub rotation_angle_degrees: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
}

fn unit_scale() -> f64 {
    1.0
}

impl From<&RigidTransform> for TransformRecord {
    fn from(transform: &RigidTransform) -> Self {
        let m = transform.to_matrix();
        let mut matrix = [[0.0; 4]; 4];
        for (r, row) in matrix.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = m[(r, c)];
            }
        }
        let t = transform.translation();
        Self {
            matrix,
            translation: [t.x, t.y, t.z],
            rotation_angle_degrees: transform.rotation_angle().to_degrees(),
            scale: transform.scale(),
        }
    }
}

impl TransformRecord {
    /// Rebuild the transform from `matrix`, failing if it is not a similarity.
    pub fn to_transform(&self) -> Result<RigidTransform> {
        let m = Matrix4::from_fn(|r, c| self.matrix[r][c]);
        RigidTransform::from_matrix(&m).context("Matrix is not a rotation, translation and uniform scale")
    }
}

fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn write_transform_json<P: AsRef<Path>>(path: P, transform: &RigidTransform) -> Result<()> {
    write_json(path, &TransformRecord::from(transform))
}

pub fn read_transform_json<P: AsRef<Path>>(path: P) -> Result<RigidTransform> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let record: TransformRecord = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse transform {}", path.display()))?;
    record.to_transform()
}

/// Write the full registration report, with the transform also given as a matrix.
pub fn write_report_json<P: AsRef<Path>>(path: P, report: &CatheterRegistrationReport) -> Result<()> {
    #[derive(Serialize)]
    struct ReportFile<'a> {
        #[serde(flatten)]
        report: &'a CatheterRegistrationReport,
        transform_matrix: TransformRecord,
    }

    write_json(
        path,
        &ReportFile {
            report,
            transform_matrix: TransformRecord::from(report.transform()),
        },
    )
}
