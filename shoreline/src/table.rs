//! Flat CSV tables exchanged between stages.

use crate::{ConfigError, CsvFormat, Error};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

/// One sampled point of a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    /// Transect id.
    pub no_transect: u32,
    /// Transect length, 2 decimals.
    pub length_transect: f64,
    /// Position along the profile, 0-based.
    pub no_point: usize,
    /// Source grid file name.
    pub dem: String,
    /// Pixel row in the clipped grid.
    pub x_image: i64,
    /// Pixel column in the clipped grid.
    pub y_image: i64,
    pub x_geo: f64,
    pub y_geo: f64,
    pub elevation: f64,
    pub slope: f64,
}

/// A [`ProfileRow`] joined against the crop boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CroppedRow {
    pub no_transect: u32,
    pub length_transect: f64,
    pub no_point: usize,
    pub dem: String,
    pub x_image: i64,
    pub y_image: i64,
    pub x_geo: f64,
    pub y_geo: f64,
    pub elevation: f64,
    pub slope: f64,
    /// 1-based index of the containing boundary polygon, empty when
    /// the point lies outside every polygon.
    #[serde(default)]
    pub boundary_id: Option<u32>,
}

impl CroppedRow {
    pub fn new(row: ProfileRow, boundary_id: Option<u32>) -> Self {
        Self {
            no_transect: row.no_transect,
            length_transect: row.length_transect,
            no_point: row.no_point,
            dem: row.dem,
            x_image: row.x_image,
            y_image: row.y_image,
            x_geo: row.x_geo,
            y_geo: row.y_geo,
            elevation: row.elevation,
            slope: row.slope,
            boundary_id,
        }
    }

    pub fn in_boundary(&self) -> bool {
        self.boundary_id.is_some()
    }
}

/// Feature indices of one profile, as `no_point` values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub profile_id: u32,
    pub method: u8,
    pub profile_smooth: bool,
    pub first_zero: usize,
    pub last_zero: usize,
    pub bottom: usize,
    pub top: usize,
}

impl FeatureRow {
    pub const COLUMNS: &'static [&'static str] = &[
        "profile_id",
        "method",
        "profile_smooth",
        "first_zero",
        "last_zero",
        "bottom",
        "top",
    ];
}

/// Reads every record of the table at `path`.
pub fn read<T: DeserializeOwned>(path: &Path, format: CsvFormat) -> Result<Vec<T>, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(format.delimiter()?)
        .from_path(path)?;
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Writes `rows`, with a header line, to `path`.
pub fn write<'a, T, I>(path: &Path, rows: I, format: CsvFormat) -> Result<(), Error>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(format.delimiter()?)
        .from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes a table holding only the `columns` header line.
pub fn write_header(path: &Path, columns: &[&str], format: CsvFormat) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(format.delimiter()?)
        .from_path(path)?;
    wtr.write_record(columns)?;
    wtr.flush()?;
    Ok(())
}

/// Returns the `.csv` files in `dir` ordered by the profile id in
/// their names (files without one sort last, by name).
pub fn list(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    if !dir.is_dir() {
        return Err(ConfigError::Path(dir.to_owned()).into());
    }
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if Some("csv") == path.extension().and_then(OsStr::to_str) {
            paths.push(path);
        }
    }
    paths.sort_by_cached_key(|path| {
        let name = file_name(path);
        (profile_id(&name).unwrap_or(u32::MAX), name)
    });
    Ok(paths)
}

/// Returns the first run of up to four digits in `name`.
pub fn profile_id(name: &str) -> Option<u32> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let digits: String = name[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .take(4)
        .collect();
    digits.parse().ok()
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(OsStr::to_str)
        .unwrap_or_default()
        .to_string()
}

/// Rounds to 2 decimals, the precision of every published table.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
