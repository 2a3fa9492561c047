use crate::options::Sample;
use anyhow::Result;
use indicatif::{MultiProgress, ProgressDrawTarget};
use shoreline::{
    progress,
    sampler::{ClipDirs, Sampler},
    transect, TileMode, Tiles,
};

impl Sample {
    pub fn run(&self) -> Result<()> {
        let progress_group = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(4));
        let tiles = Tiles::new(self.dem.clone(), TileMode::memmap(self.memmap))?;
        let buffers = transect::load_buffers(&self.buffers)?;
        let dirs = ClipDirs::new(&self.out_dir);
        dirs.create()?;
        let pb = progress_group.add(progress::bar(
            format!("Sample {} grids", tiles.paths().len()),
            0,
        ));
        let report = Sampler::new(&tiles, &dirs).run(&buffers, &pb);
        pb.finish();
        println!(
            "{} clips written, {} empty, {} failed",
            report.written, report.discarded, report.failed
        );
        Ok(())
    }
}
