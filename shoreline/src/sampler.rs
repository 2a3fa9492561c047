//! Raster Sampler: per transect clips of every source grid.

use crate::{
    slope::slope,
    tiles::{tile_name, Tiles},
    transect::Buffer,
    DataQualityError, Error,
};
use demgrid::{Endian, Grid, Header, Statistics, DEFAULT_NODATA};
use geo::{BoundingRect, Contains, Point, Polygon};
use indicatif::ProgressBar;
use log::{debug, error, info};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Output directories of the sampler, read back by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipDirs {
    pub cropped: PathBuf,
    pub slope: PathBuf,
}

impl ClipDirs {
    /// Returns the conventional `cropped/` and `slope/` children of
    /// `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            cropped: root.join("cropped"),
            slope: root.join("slope"),
        }
    }

    pub fn create(&self) -> Result<(), Error> {
        std::fs::create_dir_all(&self.cropped)?;
        std::fs::create_dir_all(&self.slope)?;
        Ok(())
    }

    /// `{transect_id}_crop_{tile}`
    pub fn cropped_path(&self, transect_id: u32, tile_name: &str) -> PathBuf {
        self.cropped.join(format!("{transect_id}_crop_{tile_name}"))
    }

    /// `{transect_id}_slope_{tile}`
    pub fn slope_path(&self, transect_id: u32, tile_name: &str) -> PathBuf {
        self.slope.join(format!("{transect_id}_slope_{tile_name}"))
    }
}

/// Result of one (tile, transect) task.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipOutcome {
    Written(Statistics),
    Discarded(DataQualityError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleReport {
    pub written: usize,
    pub discarded: usize,
    pub failed: usize,
}

pub struct Sampler<'a> {
    tiles: &'a Tiles,
    dirs: &'a ClipDirs,
}

impl<'a> Sampler<'a> {
    pub fn new(tiles: &'a Tiles, dirs: &'a ClipDirs) -> Self {
        Self { tiles, dirs }
    }

    /// Clips every tile to every buffer in parallel.
    ///
    /// Failed tasks are logged and counted; they never stop sibling
    /// tasks.
    pub fn run(&self, buffers: &[Buffer], progress: &ProgressBar) -> SampleReport {
        let tasks: Vec<(&Path, &Buffer)> = self
            .tiles
            .paths()
            .iter()
            .flat_map(|tile| buffers.iter().map(move |buffer| (tile.as_path(), buffer)))
            .collect();
        progress.set_length(tasks.len() as u64);

        let report = tasks
            .par_iter()
            .map(|&(tile, buffer)| {
                let outcome = self.sample(tile, buffer);
                progress.inc(1);
                match outcome {
                    Ok(ClipOutcome::Written(_)) => SampleReport {
                        written: 1,
                        ..SampleReport::default()
                    },
                    Ok(ClipOutcome::Discarded(reason)) => {
                        debug!("{reason}");
                        SampleReport {
                            discarded: 1,
                            ..SampleReport::default()
                        }
                    }
                    Err(e) => {
                        error!("transect {}, {tile:?}: {e}", buffer.id);
                        SampleReport {
                            failed: 1,
                            ..SampleReport::default()
                        }
                    }
                }
            })
            .reduce(SampleReport::default, |a, b| SampleReport {
                written: a.written + b.written,
                discarded: a.discarded + b.discarded,
                failed: a.failed + b.failed,
            });
        info!(
            "sampled {} clips: {} written, {} empty, {} failed",
            tasks.len(),
            report.written,
            report.discarded,
            report.failed
        );
        report
    }

    /// Clips `tile` to `buffer` and writes the clip and its slope.
    pub fn sample(&self, tile: &Path, buffer: &Buffer) -> Result<ClipOutcome, Error> {
        let grid = self.tiles.get(tile)?;
        let name = tile_name(tile);
        let empty = || {
            ClipOutcome::Discarded(DataQualityError::EmptyClip {
                transect_id: buffer.id,
                tile: name.clone(),
            })
        };
        let Some(clipped) = clip(&grid, &buffer.polygon) else {
            return Ok(empty());
        };
        let stats = clipped.statistics();
        if stats.is_degenerate() {
            return Ok(empty());
        }
        clipped.write(self.dirs.cropped_path(buffer.id, &name))?;
        slope(&clipped).write(self.dirs.slope_path(buffer.id, &name))?;
        Ok(ClipOutcome::Written(stats))
    }
}

/// Returns `grid` cut to `cutline`.
///
/// The output covers the cutline's bounding box snapped outward to
/// the source cells. Cells whose center lies outside the cutline, or
/// outside the source, or that are no-data in the source, are
/// [`DEFAULT_NODATA`]. Returns `None` for an empty cutline.
pub fn clip(grid: &Grid, cutline: &Polygon<f64>) -> Option<Grid> {
    let rect = cutline.bounding_rect()?;
    let gt = grid.geo_transform();
    let col0 = ((rect.min().x - gt.x_origin) / gt.pixel_width).floor();
    let col1 = ((rect.max().x - gt.x_origin) / gt.pixel_width).ceil();
    let row0 = ((gt.y_origin - rect.max().y) / gt.pixel_height).floor();
    let row1 = ((gt.y_origin - rect.min().y) / gt.pixel_height).ceil();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (ncols, nrows) = ((col1 - col0) as usize, (row1 - row0) as usize);
    if ncols == 0 || nrows == 0 {
        return None;
    }

    let header = Header {
        ncols,
        nrows,
        xllcorner: gt.x_origin + col0 * gt.pixel_width,
        yllcorner: gt.y_origin - row1 * gt.pixel_height,
        cellsize: gt.pixel_width,
        nodata: DEFAULT_NODATA,
        endian: Endian::Little,
    };
    let out_gt = header.geo_transform();
    #[allow(clippy::cast_possible_truncation)]
    let (row_offset, col_offset) = (row0 as isize, col0 as isize);

    let mut samples = Vec::with_capacity(header.len());
    for row in 0..nrows {
        for col in 0..ncols {
            let (x, y) = out_gt.pixel_center(row, col);
            let value = if cutline.contains(&Point::new(x, y)) {
                source_value(grid, row as isize + row_offset, col as isize + col_offset)
            } else {
                None
            };
            samples.push(value.unwrap_or(DEFAULT_NODATA));
        }
    }
    Grid::new(header, samples).ok()
}

fn source_value(grid: &Grid, row: isize, col: isize) -> Option<f32> {
    grid.value(usize::try_from(row).ok()?, usize::try_from(col).ok()?)
}

#[cfg(test)]
mod tests {
    use super::{clip, ClipDirs, ClipOutcome, Sampler};
    use crate::{
        tiles::{TileMode, Tiles},
        transect::Buffer,
        DataQualityError,
    };
    use demgrid::{Endian, Grid, Header};
    use geo::polygon;
    use indicatif::ProgressBar;

    fn source() -> Grid {
        // 10 x 10 cells of 1 unit, south-west corner at the origin;
        // the value is one more than the column index.
        let header = Header {
            ncols: 10,
            nrows: 10,
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize: 1.0,
            nodata: -1.0,
            endian: Endian::Little,
        };
        let samples = (0..100).map(|i| (i % 10) as f32 + 1.0).collect();
        Grid::new(header, samples).unwrap()
    }

    #[test]
    fn test_clip_snaps_and_masks() {
        let grid = source();
        let cutline = polygon![
            (x: 2.5, y: 2.5),
            (x: 5.5, y: 2.5),
            (x: 5.5, y: 4.2),
            (x: 2.5, y: 4.2),
            (x: 2.5, y: 2.5),
        ];
        let out = clip(&grid, &cutline).unwrap();
        assert_eq!(out.dimensions(), (3, 4));
        assert_eq!(out.header().xllcorner, 2.0);
        assert_eq!(out.header().yllcorner, 2.0);
        // Cell centers on or past the cutline edge are masked.
        assert_eq!(out.value(0, 1), None);
        assert_eq!(out.value(1, 0), None);
        assert_eq!(out.value(2, 2), None);
        assert_eq!(out.value(1, 1), Some(4.0));
        assert_eq!(out.value(1, 2), Some(5.0));
        assert_eq!(out.statistics().count, 2);
    }

    #[test]
    fn test_clip_outside_source_is_degenerate() {
        let grid = source();
        let cutline = polygon![
            (x: 50.0, y: 50.0),
            (x: 52.0, y: 50.0),
            (x: 52.0, y: 52.0),
            (x: 50.0, y: 52.0),
            (x: 50.0, y: 50.0),
        ];
        let out = clip(&grid, &cutline).unwrap();
        assert!(out.statistics().is_degenerate());
    }

    #[test]
    fn test_sample_writes_clip_and_slope() {
        let root = std::env::temp_dir().join(format!("shoreline-{}-sampler", std::process::id()));
        let dem = root.join("dem");
        std::fs::create_dir_all(&dem).unwrap();
        source().write(dem.join("dem_2020.flt")).unwrap();
        let dirs = ClipDirs::new(&root.join("clips"));
        dirs.create().unwrap();

        let tiles = Tiles::new(dem.clone(), TileMode::InMem).unwrap();
        let sampler = Sampler::new(&tiles, &dirs);
        let inside = Buffer {
            id: 1,
            polygon: polygon![
                (x: 1.0, y: 1.0),
                (x: 6.0, y: 1.0),
                (x: 6.0, y: 6.0),
                (x: 1.0, y: 6.0),
                (x: 1.0, y: 1.0),
            ],
        };
        let outside = Buffer {
            id: 2,
            polygon: polygon![
                (x: 20.0, y: 20.0),
                (x: 22.0, y: 20.0),
                (x: 22.0, y: 22.0),
                (x: 20.0, y: 22.0),
                (x: 20.0, y: 20.0),
            ],
        };
        let report = sampler.run(&[inside.clone(), outside.clone()], &ProgressBar::hidden());
        assert_eq!(report.written, 1);
        assert_eq!(report.discarded, 1);
        assert_eq!(report.failed, 0);

        assert!(demgrid::exists(&dirs.cropped_path(1, "dem_2020.flt")));
        assert!(demgrid::exists(&dirs.slope_path(1, "dem_2020.flt")));
        assert!(!demgrid::exists(&dirs.cropped_path(2, "dem_2020.flt")));

        let tile = dem.join("dem_2020.flt");
        assert_eq!(
            sampler.sample(&tile, &outside).unwrap(),
            ClipOutcome::Discarded(DataQualityError::EmptyClip {
                transect_id: 2,
                tile: "dem_2020.flt".to_string(),
            })
        );
        std::fs::remove_dir_all(root).unwrap();
    }
}
