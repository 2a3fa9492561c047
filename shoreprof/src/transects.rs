use crate::options::Transects;
use anyhow::Result;
use shoreline::{transect, TransectConfig};
use std::fs;

impl Transects {
    pub fn run(&self) -> Result<()> {
        let cfg = TransectConfig {
            spacing: self.spacing,
            length: self.length,
            buffer_width: self.buffer_width,
            use_precalculated: self.precomputed.is_some(),
        };
        let transects = transect::build(&cfg, &self.coastline, self.precomputed.as_deref())?;
        let buffers = transect::buffers(&transects, cfg.buffer_width());
        fs::create_dir_all(&self.out_dir)?;
        let crs = self.crs.as_deref();
        transect::write(&self.out_dir.join("transects.geojson"), &transects, crs)?;
        transect::write_buffers(&self.out_dir.join("buffers.geojson"), &buffers, crs)?;
        println!("{} transects, {} buffers", transects.len(), buffers.len());
        Ok(())
    }
}
