//! Profile Cropper: joins profile points against an analysis
//! boundary.

use crate::{
    layer,
    table::{self, CroppedRow, ProfileRow},
    ConfigError, CropMode, CsvFormat, Error,
};
use geo::{Contains, Geometry, Point, Polygon};
use indicatif::ProgressBar;
use log::{error, info};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// One or more analysis polygons.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    polygons: Vec<Polygon<f64>>,
}

impl Boundary {
    pub fn new(polygons: Vec<Polygon<f64>>) -> Self {
        Self { polygons }
    }

    /// Loads every polygon of the layer at `path` (file, or directory
    /// holding one).
    pub fn load(path: &Path) -> Result<Self, Error> {
        let layer_path = layer::resolve(path)?;
        let mut polygons = Vec::new();
        for geometry in layer::geometries(&layer_path)? {
            match geometry {
                Geometry::Polygon(polygon) => polygons.push(polygon),
                Geometry::MultiPolygon(multi) => polygons.extend(multi),
                Geometry::Rect(rect) => polygons.push(rect.to_polygon()),
                _ => (),
            }
        }
        if polygons.is_empty() {
            return Err(ConfigError::NoBoundary(layer_path).into());
        }
        Ok(Self { polygons })
    }

    /// Returns the 1-based index of the first polygon strictly
    /// containing `(x, y)`.
    pub fn locate(&self, x: f64, y: f64) -> Option<u32> {
        let point = Point::new(x, y);
        self.polygons
            .iter()
            .position(|polygon| polygon.contains(&point))
            .and_then(|idx| u32::try_from(idx + 1).ok())
    }

    /// Tags every row with its boundary polygon; with
    /// [`CropMode::Drop`] rows outside the boundary are removed.
    pub fn crop(&self, rows: Vec<ProfileRow>, mode: CropMode) -> Vec<CroppedRow> {
        rows.into_iter()
            .map(|row| {
                let boundary_id = self.locate(row.x_geo, row.y_geo);
                CroppedRow::new(row, boundary_id)
            })
            .filter(|row| mode == CropMode::Flag || row.in_boundary())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CropReport {
    pub written: usize,
    pub failed: usize,

    /// Tables without a single point in the boundary.
    pub outside: usize,
}

pub struct Cropper<'a> {
    boundary: &'a Boundary,
    mode: CropMode,
    format: CsvFormat,
}

impl<'a> Cropper<'a> {
    pub fn new(boundary: &'a Boundary, mode: CropMode, format: CsvFormat) -> Self {
        Self {
            boundary,
            mode,
            format,
        }
    }

    /// Crops every profile table in `in_dir` into `out_dir`, one
    /// output table per input.
    pub fn run(&self, in_dir: &Path, out_dir: &Path, progress: &ProgressBar) -> Result<CropReport, Error> {
        let inputs = table::list(in_dir)?;
        std::fs::create_dir_all(out_dir)?;
        progress.set_length(inputs.len() as u64);

        let report = inputs
            .par_iter()
            .map(|input| {
                let result = self.crop_file(input, out_dir);
                progress.inc(1);
                match result {
                    Ok(true) => CropReport {
                        written: 1,
                        ..CropReport::default()
                    },
                    Ok(false) => CropReport {
                        written: 1,
                        outside: 1,
                        ..CropReport::default()
                    },
                    Err(e) => {
                        error!("{input:?}: {e}");
                        CropReport {
                            failed: 1,
                            ..CropReport::default()
                        }
                    }
                }
            })
            .reduce(CropReport::default, |a, b| CropReport {
                written: a.written + b.written,
                failed: a.failed + b.failed,
                outside: a.outside + b.outside,
            });
        info!(
            "cropped {} tables: {} written, {} entirely outside, {} failed",
            inputs.len(),
            report.written,
            report.outside,
            report.failed
        );
        Ok(report)
    }

    /// Crops one table. Returns `false` if none of its points lie in
    /// the boundary.
    pub fn crop_file(&self, input: &Path, out_dir: &Path) -> Result<bool, Error> {
        let rows: Vec<ProfileRow> = table::read(input, self.format)?;
        let cropped = self.boundary.crop(rows, self.mode);
        let any_inside = cropped.iter().any(CroppedRow::in_boundary);
        table::write(&output_path(input, out_dir), &cropped, self.format)?;
        Ok(any_inside)
    }
}

/// Output path of a cropped table: the input name with `whole`
/// replaced by `crop`.
pub fn output_path(input: &Path, out_dir: &Path) -> PathBuf {
    out_dir.join(table::file_name(input).replace("whole", "crop"))
}
