mod crop;
mod find;
mod generate;
mod options;
mod profiles;
mod sample;
mod stats;
mod transects;

use anyhow::Result;
use clap::Parser;
use options::Cli;
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli {
        Cli::Transects(transects) => transects.run(),
        Cli::Sample(sample) => sample.run(),
        Cli::Profiles(profiles) => profiles.run(),
        Cli::Crop(crop) => crop.run(),
        Cli::Find(find) => find.run(),
        Cli::Stats(stats) => stats.run(),
        Cli::Generate(generate) => generate.run(),
    }
}
