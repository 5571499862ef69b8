use nalgebra::Point3;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PointsIoError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Record {record} has a non-finite coordinate")]
    NonFinite { record: usize },
}

#[derive(Debug, Deserialize)]
struct PointRecord {
    x: f64,
    y: f64,
    z: f64,
}

/// Reads a point cloud from CSV with an `x,y,z` header.
///
/// Columns are matched by name, so extra columns (atom names, residue ids) are
/// ignored and may appear in any order. Point indices follow record order.
pub fn read_points_csv(reader: impl Read) -> Result<Vec<Point3<f64>>, PointsIoError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();
    for (record, result) in reader.deserialize::<PointRecord>().enumerate() {
        let PointRecord { x, y, z } = result?;
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(PointsIoError::NonFinite { record });
        }
        points.push(Point3::new(x, y, z));
    }
    Ok(points)
}

pub fn read_points_csv_path(path: &Path) -> Result<Vec<Point3<f64>>, PointsIoError> {
    let file = std::fs::File::open(path).map_err(|e| PointsIoError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    read_points_csv(std::io::BufReader::new(file))
}
