use crate::options::Profiles;
use anyhow::Result;
use indicatif::{MultiProgress, ProgressDrawTarget};
use shoreline::{
    profile::Extractor, progress, sampler::ClipDirs, tiles::tile_name, transect, CsvFormat,
    ProfileConfig, TileMode, Tiles,
};
use std::fs;

impl Profiles {
    pub fn run(&self) -> Result<()> {
        let cfg = ProfileConfig {
            resolution: self.resolution,
            memmap: self.memmap,
        };
        cfg.validate()?;
        let progress_group = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(4));
        let tile_mode = TileMode::memmap(cfg.memmap);
        let tiles = Tiles::new(self.dem.clone(), tile_mode)?;
        let transects = transect::load(&self.transects)?;
        let dirs = ClipDirs::new(&self.clips);
        let format = CsvFormat { sep: self.sep };
        fs::create_dir_all(&self.out_dir)?;

        let extractor = Extractor::new(&dirs, cfg.resolution, tile_mode);
        for tile in tiles.paths() {
            let pb = progress_group.add(progress::bar(
                format!("Profiles {}", tile_name(tile)),
                transects.len() as u64,
            ));
            let extracted = extractor.extract_tile(tile, &transects, &pb);
            extracted.write(&self.out_dir, format, self.crs.as_deref())?;
            pb.finish();
            println!(
                "{}: {} profiles, {} missing, {} failed{}",
                extracted.tile,
                extracted.profiles.len(),
                extracted.missing,
                extracted.failed,
                if extracted.direction.reversed {
                    ", reversed"
                } else {
                    ""
                }
            );
        }
        Ok(())
    }
}
