use crate::options::Generate;
use anyhow::Result;
use indicatif::{MultiProgress, ProgressDrawTarget};
use shoreline::{Generator, GeneratorConfig};

impl Generate {
    pub fn run(&self) -> Result<()> {
        let cfg = GeneratorConfig::from_path(&self.config)?;
        let progress_group = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(4));
        let generator = Generator::new(&cfg);
        let report = generator.run(&progress_group)?;
        println!(
            "{} transects, {} clips ({} empty, {} failed), {} profiles ({} missing, {} failed), {} cropped tables",
            report.transects,
            report.sample.written,
            report.sample.discarded,
            report.sample.failed,
            report.profiles,
            report.missing,
            report.failed,
            report.crop.written
        );
        println!("output in {}", generator.layout().root.display());
        Ok(())
    }
}
