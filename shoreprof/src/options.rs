use clap::{Args, Parser};
use shoreline::stats::EpochSource;
use std::path::PathBuf;

/// Coastal profiles and shoreline change from elevation grids.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub enum Cli {
    /// Cast shore-normal transects and their clip buffers.
    Transects(Transects),

    /// Clip every elevation grid to every transect buffer.
    Sample(Sample),

    /// Walk transects over the clipped grids.
    Profiles(Profiles),

    /// Join profile tables against an analysis boundary.
    Crop(Crop),

    /// Locate waterline, base and crest in cropped profiles.
    Find(Find),

    /// Compare feature points between epochs.
    Stats(Stats),

    /// Run transects, sample, profiles and crop from one JSON file.
    Generate(Generate),
}

#[derive(Debug, Clone, Args)]
pub struct Transects {
    /// Along-coast distance between transects.
    #[arg(short, long, default_value_t = 50.0)]
    pub spacing: f64,

    /// Transect length, centered on the coastline.
    #[arg(short, long, default_value_t = 40.0)]
    pub length: f64,

    /// Clip buffer half-width; half the spacing if not given.
    #[arg(short, long)]
    pub buffer_width: Option<f64>,

    /// Use this transect layer instead of generating transects.
    #[arg(long)]
    pub precomputed: Option<PathBuf>,

    /// Reference system label for the written layers.
    #[arg(long)]
    pub crs: Option<String>,

    /// Output directory.
    #[arg(short, long)]
    pub out_dir: PathBuf,

    /// Coastline layer, or a directory holding one.
    pub coastline: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct Sample {
    /// Memory map source grids instead of loading them.
    #[arg(short, long)]
    pub memmap: bool,

    /// Buffer layer written by `transects`.
    #[arg(short, long)]
    pub buffers: PathBuf,

    /// Output directory; clips land in `cropped/` and `slope/`.
    #[arg(short, long)]
    pub out_dir: PathBuf,

    /// Directory of source elevation grids.
    pub dem: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct Profiles {
    /// Step between consecutive samples.
    #[arg(short, long, default_value_t = 0.5)]
    pub resolution: f64,

    /// Memory map clipped grids instead of loading them.
    #[arg(short, long)]
    pub memmap: bool,

    /// Transect layer written by `transects`.
    #[arg(short, long)]
    pub transects: PathBuf,

    /// Output directory of `sample`.
    #[arg(short, long)]
    pub clips: PathBuf,

    #[arg(long, default_value_t = ',')]
    pub sep: char,

    #[arg(long)]
    pub crs: Option<String>,

    /// Output directory.
    #[arg(short, long)]
    pub out_dir: PathBuf,

    /// Directory of source elevation grids.
    pub dem: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct Crop {
    /// Remove rows outside the boundary instead of flagging them.
    #[arg(short, long)]
    pub drop: bool,

    /// Boundary layer, or a directory holding one.
    #[arg(short, long)]
    pub boundary: PathBuf,

    #[arg(long, default_value_t = ',')]
    pub sep: char,

    /// Output directory.
    #[arg(short, long)]
    pub out_dir: PathBuf,

    /// Directory of profile tables.
    pub input: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct Find {
    /// JSON finder settings; command line flags are ignored when
    /// given.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Reference elevation of the waterline.
    #[arg(short = 'z', long, default_value_t = 0.5)]
    pub elevation_zero: f64,

    #[arg(short = 'p', long, default_value_t = 10)]
    pub min_profile_points: usize,

    /// Points searched past the elevation maximum.
    #[arg(short = 'b', long, default_value_t = 10)]
    pub beyond_top_buffer: usize,

    /// Smooth elevation before locating base and crest.
    #[arg(short, long)]
    pub smooth: bool,

    #[arg(long, default_value_t = 5)]
    pub smooth_window: usize,

    /// 1: plain extrema, 2: crest with beyond-top buffer.
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub method: u8,

    /// Only process these profile ids.
    #[arg(long, value_delimiter = ',')]
    pub profiles: Vec<u32>,

    #[arg(long, default_value_t = ',')]
    pub sep: char,

    #[arg(long)]
    pub crs: Option<String>,

    /// Output directory.
    #[arg(short, long)]
    pub out_dir: PathBuf,

    /// Directory of cropped profile tables.
    pub input: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct Stats {
    /// Feature layer to compare.
    #[arg(short, long, default_value = "top")]
    pub line: String,

    /// Write metric tables here.
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    #[arg(long, default_value_t = ',')]
    pub sep: char,

    /// Epochs in order, as LABEL=PATH or PATH; a path may be a finder
    /// output directory.
    #[arg(required = true, num_args = 2..)]
    pub epochs: Vec<EpochSource>,
}

#[derive(Debug, Clone, Args)]
pub struct Generate {
    /// Generator JSON configuration.
    #[arg(short, long)]
    pub config: PathBuf,
}
