pub mod coastline;
mod config;
pub mod crop;
mod error;
pub mod finder;
pub mod layer;
pub mod pipeline;
pub mod profile;
pub mod progress;
pub mod sampler;
pub mod slope;
pub mod stats;
pub mod table;
pub mod tiles;
pub mod transect;

pub use crate::{
    config::{
        CropConfig, CropMode, CsvFormat, FinderConfig, GeneratorConfig, GeneratorPaths, Method,
        ProfileConfig, StatsConfig, TransectConfig,
    },
    error::{ConfigError, DataQualityError, Error, StatsError},
    pipeline::{Generator, GeneratorReport, Layout},
    tiles::{TileMode, Tiles},
};
pub use demgrid;
pub use geo;
