use crate::options::Find;
use anyhow::Result;
use shoreline::{finder::Finder, CsvFormat, FinderConfig, Method};
use std::{fs::File, io::BufReader};

impl Find {
    pub fn run(&self) -> Result<()> {
        let cfg = match &self.config {
            Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
            None => FinderConfig {
                elevation_zero: self.elevation_zero,
                min_profile_points: self.min_profile_points,
                beyond_top_buffer: self.beyond_top_buffer,
                smooth: self.smooth,
                smooth_window: self.smooth_window,
                method: Method::try_from(self.method)?,
                selected_profiles: self.profiles.clone(),
            },
        };
        let format = CsvFormat { sep: self.sep };
        let report = Finder::new(&cfg, format).run(&self.input)?;
        report.write(&self.out_dir, format, self.crs.as_deref())?;
        println!(
            "features in {} profiles, {} skipped, {} failed",
            report.detections.len(),
            report.skipped.len(),
            report.failed
        );
        for skipped in &report.skipped {
            println!("  profile {}: {}", skipped.profile_id, skipped.reason);
        }
        Ok(())
    }
}
