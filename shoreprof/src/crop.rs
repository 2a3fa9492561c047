use crate::options::Crop;
use anyhow::Result;
use indicatif::{MultiProgress, ProgressDrawTarget};
use shoreline::{
    crop::{Boundary, Cropper},
    progress, CropMode, CsvFormat,
};

impl Crop {
    pub fn run(&self) -> Result<()> {
        let progress_group = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(4));
        let boundary = Boundary::load(&self.boundary)?;
        let mode = if self.drop {
            CropMode::Drop
        } else {
            CropMode::Flag
        };
        let pb = progress_group.add(progress::bar("Crop".to_string(), 0));
        let report = Cropper::new(&boundary, mode, CsvFormat { sep: self.sep }).run(
            &self.input,
            &self.out_dir,
            &pb,
        )?;
        pb.finish();
        println!(
            "{} tables written ({} entirely outside), {} failed",
            report.written, report.outside, report.failed
        );
        Ok(())
    }
}
