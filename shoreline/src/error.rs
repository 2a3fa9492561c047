use demgrid::GridError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    GeoJson(#[from] geojson::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Grid(#[from] GridError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("data quality: {0}")]
    DataQuality(#[from] DataQualityError),

    #[error("metric unavailable: {0}")]
    Stats(#[from] StatsError),
}

/// Fatal setup problems; these abort a run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no coastline found in {0}")]
    NoCoastlineFound(PathBuf),

    #[error("coastline in {0} has parts that cannot be merged into one line")]
    DisjointCoastline(PathBuf),

    #[error("spacing {spacing} and length {length} produce no transects")]
    EmptyTransectSet { spacing: f64, length: f64 },

    #[error("no elevation grids in {0}")]
    NoTiles(PathBuf),

    #[error("no polygons found in {0}")]
    NoBoundary(PathBuf),

    #[error("path {0} does not exist or is not a directory")]
    Path(PathBuf),

    #[error("feature {index} in {path} has no usable '{field}'")]
    Feature {
        path: PathBuf,
        index: usize,
        field: &'static str,
    },

    #[error("parameter '{0}' must be positive")]
    NonPositive(&'static str),

    #[error("unknown method variant {0}")]
    Method(u8),

    #[error("csv separator {0:?} is not a single ASCII character")]
    Separator(char),

    #[error("unknown feature line '{0}'")]
    Line(String),

    #[error("missing required parameters: {0}")]
    Builder(&'static str),
}

/// Per-item problems, recovered by excluding the item.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataQualityError {
    #[error("clip of transect {transect_id} from {tile} holds no terrain")]
    EmptyClip { transect_id: u32, tile: String },

    #[error("missing clipped raster {0}")]
    MissingRaster(PathBuf),

    #[error("profile has {have} points in its search window, need {need}")]
    TooFewPoints { have: usize, need: usize },

    #[error("profile has no points inside the crop boundary")]
    OutsideBoundary,

    #[error("elevation never crosses {0}")]
    NoWaterline(f64),

    #[error("smoothing needs {need} points, window has {have}")]
    Smoothing { have: usize, need: usize },
}

/// Computation problems of the change statistics; reported as
/// "metric unavailable", never defaulted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("{0} epochs selected, at least 2 are required")]
    InsufficientEpochs(usize),

    #[error("no profile ids common to the selected epochs")]
    NoCommonProfiles,

    #[error("first and last epoch share year {0}")]
    DivisionByZeroYears(i32),

    #[error("no four digit year in epoch label '{0}'")]
    NoYear(String),

    #[error("no profile has enough data for {0}")]
    NoData(&'static str),
}
