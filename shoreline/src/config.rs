//! Typed per-stage configuration.
//!
//! Every struct deserializes with the defaults of the field tools,
//! so a JSON file only needs the keys it changes.

use crate::{finder::FeatureKind, stats::EpochSource, ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

/// Geometry Builder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransectConfig {
    /// Along-coast distance between transects (map units).
    pub spacing: f64,

    /// Total transect length, centered on the coastline.
    pub length: f64,

    /// Half-width of each transect's clipping buffer. Defaults to
    /// half the spacing.
    pub buffer_width: Option<f64>,

    /// Load transects from the precomputed layer, when one is given,
    /// instead of generating them.
    pub use_precalculated: bool,
}

impl Default for TransectConfig {
    fn default() -> Self {
        Self {
            spacing: 50.0,
            length: 40.0,
            buffer_width: None,
            use_precalculated: false,
        }
    }
}

impl TransectConfig {
    pub fn buffer_width(&self) -> f64 {
        self.buffer_width.unwrap_or(self.spacing / 2.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("spacing", self.spacing)?;
        positive("length", self.length)?;
        positive("buffer_width", self.buffer_width())
    }
}

/// Profile Extractor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Step between consecutive profile samples (map units).
    pub resolution: f64,

    /// Memory map clipped grids instead of reading them.
    pub memmap: bool,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            resolution: 0.5,
            memmap: false,
        }
    }
}

impl ProfileConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("resolution", self.resolution)
    }
}

/// What the Profile Cropper does with points outside the boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropMode {
    /// Keep them with an empty `boundary_id`.
    #[default]
    Flag,
    /// Remove them from the output table.
    Drop,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    pub mode: CropMode,
}

/// Crest detection variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Method {
    /// Crest is the raw elevation maximum.
    Extremum,
    /// Crest is extended past the elevation maximum by the
    /// beyond-top buffer.
    #[default]
    CrestBuffer,
}

impl TryFrom<u8> for Method {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, ConfigError> {
        match value {
            1 => Ok(Method::Extremum),
            2 => Ok(Method::CrestBuffer),
            other => Err(ConfigError::Method(other)),
        }
    }
}

impl From<Method> for u8 {
    fn from(method: Method) -> u8 {
        match method {
            Method::Extremum => 1,
            Method::CrestBuffer => 2,
        }
    }
}

/// Feature Detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// Reference elevation of the waterline.
    pub elevation_zero: f64,

    /// Profiles whose search window holds fewer points are skipped.
    pub min_profile_points: usize,

    /// Points past the elevation maximum still searched for the
    /// crest (only used by [`Method::CrestBuffer`]).
    pub beyond_top_buffer: usize,

    /// Low-pass the elevation series before locating base and crest.
    pub smooth: bool,

    /// Moving average width used when `smooth` is set.
    pub smooth_window: usize,

    pub method: Method,

    /// Only these profile ids are processed; empty means all.
    pub selected_profiles: Vec<u32>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            elevation_zero: 0.5,
            min_profile_points: 10,
            beyond_top_buffer: 10,
            smooth: false,
            smooth_window: 5,
            method: Method::CrestBuffer,
            selected_profiles: Vec::new(),
        }
    }
}

impl FinderConfig {
    /// Returns the buffer actually applied past the crest.
    pub fn top_buffer(&self) -> usize {
        match self.method {
            Method::Extremum => 0,
            Method::CrestBuffer => self.beyond_top_buffer,
        }
    }

    pub fn is_selected(&self, profile_id: u32) -> bool {
        self.selected_profiles.is_empty() || self.selected_profiles.contains(&profile_id)
    }
}

/// Change-Statistics Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Feature layer compared across epochs (`firstZero`, `lastZero`,
    /// `bottom` or `top`).
    pub line: String,

    /// Epochs in comparison order; the first and last bound NSM and
    /// EPR.
    pub epochs: Vec<EpochSource>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            line: FeatureKind::Top.layer_name().to_string(),
            epochs: Vec::new(),
        }
    }
}

impl StatsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if FeatureKind::ALL.iter().any(|k| k.layer_name() == self.line) {
            Ok(())
        } else {
            Err(ConfigError::Line(self.line.clone()))
        }
    }
}

/// CSV dialect of every table read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvFormat {
    pub sep: char,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self { sep: ',' }
    }
}

impl CsvFormat {
    /// Returns the delimiter byte. Only ASCII separators are accepted.
    pub fn delimiter(&self) -> Result<u8, ConfigError> {
        if self.sep.is_ascii() {
            Ok(self.sep as u8)
        } else {
            Err(ConfigError::Separator(self.sep))
        }
    }
}

/// Input and output locations of the generator chain.
///
/// Relative paths are resolved against `base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorPaths {
    pub base: PathBuf,

    /// Coastline layer (file, or directory holding one).
    pub coastline: PathBuf,

    /// Optional precomputed transect layer.
    #[serde(default)]
    pub transects: Option<PathBuf>,

    /// Directory of source elevation grids.
    pub dem: PathBuf,

    /// Crop boundary layer (file, or directory holding one).
    pub crop: PathBuf,

    /// Root of every generated artifact.
    pub output: PathBuf,
}

impl GeneratorPaths {
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base.join(path)
    }
}

/// Everything `generate` needs, usually loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub paths: GeneratorPaths,

    /// Reference system label attached to written layers.
    #[serde(default)]
    pub crs: Option<String>,

    #[serde(default)]
    pub transects: TransectConfig,

    #[serde(default)]
    pub profiles: ProfileConfig,

    #[serde(default)]
    pub crop: CropConfig,

    #[serde(default)]
    pub csv: CsvFormat,
}

impl GeneratorConfig {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let rdr = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(rdr)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.transects.validate()?;
        self.profiles.validate()?;
        self.csv.delimiter().map(|_| ())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive(name))
    }
}
