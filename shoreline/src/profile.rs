//! Profile Extractor: fixed-step walks along transects.

use crate::{
    layer,
    sampler::ClipDirs,
    table::{self, round2, ProfileRow},
    tiles::{tile_name, tile_stem, TileMode},
    transect::Transect,
    ConfigError, CsvFormat, DataQualityError, Error,
};
use demgrid::Grid;
use geo::{geometry::Point, LineInterpolatePoint};
use indicatif::ProgressBar;
use itertools::Itertools;
use log::{debug, error, info};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// One sample of a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePoint {
    pub local_index: usize,

    /// Distance from the walk's start along the transect.
    pub distance: f64,

    pub x: f64,
    pub y: f64,

    /// Pixel row/column in the clipped grid.
    pub row: i64,
    pub col: i64,

    /// Elevation, `0` where the grid has no data.
    pub elevation: f64,

    /// Slope in degrees, `0` where the grid has no data.
    pub slope: f64,
}

/// Elevation and slope samples along one transect for one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub transect_id: u32,

    /// Transect length, 2 decimals.
    pub length: f64,

    /// Source tile file name.
    pub tile: String,

    pub points: Vec<ProfilePoint>,
}

impl Profile {
    pub fn builder() -> ProfileBuilder<'static> {
        ProfileBuilder {
            transect: None,
            resolution: None,
            tile: None,
        }
    }

    /// Returns the elevation trend along the walk: the summed
    /// consecutive differences between the first and last points of
    /// positive elevation.
    pub fn mono(&self) -> f64 {
        let (Some(first), Some(last)) = (
            self.points.iter().position(|p| p.elevation > 0.0),
            self.points.iter().rposition(|p| p.elevation > 0.0),
        ) else {
            return 0.0;
        };
        self.points[first..=last]
            .iter()
            .tuple_windows()
            .map(|(a, b)| b.elevation - a.elevation)
            .sum()
    }

    /// Reverses the walk direction and renumbers the points.
    pub fn reverse(&mut self) {
        self.points.reverse();
        for (idx, point) in self.points.iter_mut().enumerate() {
            point.local_index = idx;
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = ProfileRow> + '_ {
        self.points.iter().map(|p| ProfileRow {
            no_transect: self.transect_id,
            length_transect: self.length,
            no_point: p.local_index,
            dem: self.tile.clone(),
            x_image: p.row,
            y_image: p.col,
            x_geo: p.x,
            y_geo: p.y,
            elevation: round2(p.elevation),
            slope: round2(p.slope),
        })
    }

    /// `{transect_id}_whole_{tile_stem}.csv`
    pub fn file_name(&self) -> String {
        let stem = Path::new(&self.tile)
            .file_stem()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or(&self.tile);
        format!("{}_whole_{stem}.csv", self.transect_id)
    }
}

pub struct ProfileBuilder<'a> {
    transect: Option<&'a Transect>,

    /// Step between samples.
    resolution: Option<f64>,

    tile: Option<String>,
}

impl<'a> ProfileBuilder<'a> {
    pub fn transect<'b>(self, transect: &'b Transect) -> ProfileBuilder<'b> {
        ProfileBuilder {
            transect: Some(transect),
            resolution: self.resolution,
            tile: self.tile,
        }
    }

    pub fn resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn tile(mut self, name: impl Into<String>) -> Self {
        self.tile = Some(name.into());
        self
    }

    /// Walks the transect from its first vertex, sampling `elevation`
    /// and `slope` every `resolution` units while the distance is
    /// below the (rounded) transect length.
    pub fn build(&self, elevation: &Grid, slope: &Grid) -> Result<Profile, Error> {
        let (Some(transect), Some(resolution), Some(tile)) =
            (self.transect, self.resolution, self.tile.as_ref())
        else {
            return Err(ConfigError::Builder("transect, resolution and tile are required").into());
        };
        if !(resolution > 0.0) {
            return Err(ConfigError::NonPositive("resolution").into());
        }

        let true_length = transect.length();
        let length = round2(true_length);
        let gt = elevation.geo_transform();
        let lookup = |grid: &Grid, row: i64, col: i64| -> f64 {
            match (usize::try_from(row), usize::try_from(col)) {
                (Ok(row), Ok(col)) => grid.value(row, col).map_or(0.0, f64::from),
                _ => 0.0,
            }
        };

        let mut points = Vec::new();
        let mut distance = 0.0;
        while distance < length {
            let fraction = if true_length > 0.0 {
                (distance / true_length).min(1.0)
            } else {
                0.0
            };
            let Some(Point(coord)) = transect.line.line_interpolate_point(fraction) else {
                break;
            };
            let (row, col) = gt.pixel(coord.x, coord.y);
            let (row, col) = (row as i64, col as i64);
            points.push(ProfilePoint {
                local_index: points.len(),
                distance,
                x: coord.x,
                y: coord.y,
                row,
                col,
                elevation: lookup(elevation, row, col),
                slope: lookup(slope, row, col),
            });
            #[allow(clippy::cast_precision_loss)]
            {
                distance = points.len() as f64 * resolution;
            }
        }

        Ok(Profile {
            transect_id: transect.id,
            length,
            tile: tile.clone(),
            points,
        })
    }
}

/// Outcome of direction correction for one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    /// Summed [`Profile::mono`] before correction.
    pub mono: f64,

    /// `true` if every profile was reversed.
    pub reversed: bool,
}

/// Orients all profiles of one tile from water to land.
///
/// The walk direction of a transect is arbitrary; the summed
/// elevation trend of all profiles of a tile reveals it. A negative
/// sum reverses every profile. Applying this twice is a no-op.
pub fn correct_direction(profiles: &mut [Profile]) -> Direction {
    let mono: f64 = profiles.iter().map(Profile::mono).sum();
    let reversed = mono < 0.0;
    if reversed {
        profiles.iter_mut().for_each(Profile::reverse);
    }
    Direction { mono, reversed }
}

/// Every profile extracted from one tile, after direction
/// correction.
#[derive(Debug, Clone, PartialEq)]
pub struct TileProfiles {
    pub tile: String,
    pub profiles: Vec<Profile>,
    pub direction: Direction,

    /// Transects without a clip for this tile.
    pub missing: usize,

    /// Transects whose clip could not be read.
    pub failed: usize,
}

impl TileProfiles {
    /// Writes one table per profile plus the tile's combined point
    /// layer `profiles_{tile_stem}.geojson` to `out_dir`.
    pub fn write(&self, out_dir: &Path, format: CsvFormat, crs: Option<&str>) -> Result<(), Error> {
        let mut features = Vec::new();
        for profile in &self.profiles {
            let rows: Vec<ProfileRow> = profile.rows().collect();
            table::write(&out_dir.join(profile.file_name()), &rows, format)?;
            for row in &rows {
                features.push(layer::feature(
                    &Point::new(row.x_geo, row.y_geo),
                    layer::properties(row)?,
                ));
            }
        }
        let stem = tile_stem(Path::new(&self.tile));
        layer::write(
            &out_dir.join(format!("profiles_{stem}.geojson")),
            features,
            crs,
        )
    }
}

/// Walks transects over the sampler's clips.
pub struct Extractor<'a> {
    dirs: &'a ClipDirs,
    resolution: f64,
    tile_mode: TileMode,
}

impl<'a> Extractor<'a> {
    pub fn new(dirs: &'a ClipDirs, resolution: f64, tile_mode: TileMode) -> Self {
        Self {
            dirs,
            resolution,
            tile_mode,
        }
    }

    /// Extracts every transect for the tile at `tile` in parallel,
    /// then corrects their direction once all are done.
    pub fn extract_tile(
        &self,
        tile: &Path,
        transects: &[Transect],
        progress: &ProgressBar,
    ) -> TileProfiles {
        let name = tile_name(tile);
        let results: Vec<Result<Profile, Error>> = transects
            .par_iter()
            .map(|transect| {
                let result = self.extract(&name, transect);
                progress.inc(1);
                result
            })
            .collect();

        let mut profiles = Vec::with_capacity(results.len());
        let (mut missing, mut failed) = (0, 0);
        for (transect, result) in transects.iter().zip(results) {
            match result {
                Ok(profile) => profiles.push(profile),
                Err(Error::DataQuality(reason)) => {
                    debug!("transect {}: {reason}", transect.id);
                    missing += 1;
                }
                Err(e) => {
                    error!("transect {}, {name}: {e}", transect.id);
                    failed += 1;
                }
            }
        }

        let direction = correct_direction(&mut profiles);
        info!(
            "{name}: {} profiles, {missing} missing, {failed} failed, mono {:.2}{}",
            profiles.len(),
            direction.mono,
            if direction.reversed { ", reversed" } else { "" }
        );
        TileProfiles {
            tile: name,
            profiles,
            direction,
            missing,
            failed,
        }
    }

    /// Extracts one transect from its clip of `tile_name`.
    pub fn extract(&self, tile_name: &str, transect: &Transect) -> Result<Profile, Error> {
        let elevation_path = self.dirs.cropped_path(transect.id, tile_name);
        let slope_path = self.dirs.slope_path(transect.id, tile_name);
        let missing = |path: PathBuf| -> Error { DataQualityError::MissingRaster(path).into() };
        if !demgrid::exists(&elevation_path) {
            return Err(missing(elevation_path));
        }
        if !demgrid::exists(&slope_path) {
            return Err(missing(slope_path));
        }
        let elevation = self.tile_mode.open(&elevation_path)?;
        let slope = self.tile_mode.open(&slope_path)?;
        Profile::builder()
            .transect(transect)
            .resolution(self.resolution)
            .tile(tile_name)
            .build(&elevation, &slope)
    }
}
