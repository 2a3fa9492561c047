//! The generator chain: Geometry Builder, Raster Sampler, Profile
//! Extractor and Profile Cropper, run in order.

use crate::{
    crop::{Boundary, CropReport, Cropper},
    profile::Extractor,
    progress,
    sampler::{ClipDirs, SampleReport, Sampler},
    tiles::tile_name,
    transect, ConfigError, Error, GeneratorConfig, TileMode, Tiles,
};
use indicatif::MultiProgress;
use log::info;
use std::{fs, path::PathBuf};

/// Where every generated artifact lives under the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn transects(&self) -> PathBuf {
        self.root.join("transects.geojson")
    }

    pub fn buffers(&self) -> PathBuf {
        self.root.join("buffers.geojson")
    }

    /// Sampler output, `dem/cropped` and `dem/slope`.
    pub fn clips(&self) -> ClipDirs {
        ClipDirs::new(&self.root.join("dem"))
    }

    /// Extracted profile tables.
    pub fn whole(&self) -> PathBuf {
        self.root.join("profiles").join("whole")
    }

    /// Cropped profile tables, input of the finder.
    pub fn crop(&self) -> PathBuf {
        self.root.join("profiles").join("crop")
    }

    /// Feature tables and layers.
    pub fn features(&self) -> PathBuf {
        self.root.join("features")
    }

    pub fn create(&self) -> Result<(), Error> {
        fs::create_dir_all(&self.root)?;
        self.clips().create()?;
        fs::create_dir_all(self.whole())?;
        fs::create_dir_all(self.crop())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorReport {
    pub transects: usize,
    pub sample: SampleReport,
    pub profiles: usize,
    pub missing: usize,
    pub failed: usize,
    pub crop: CropReport,
}

pub struct Generator<'a> {
    cfg: &'a GeneratorConfig,
}

impl<'a> Generator<'a> {
    pub fn new(cfg: &'a GeneratorConfig) -> Self {
        Self { cfg }
    }

    pub fn layout(&self) -> Layout {
        Layout::new(self.cfg.paths.resolve(&self.cfg.paths.output))
    }

    /// Fails on the first missing input.
    pub fn check_inputs(&self) -> Result<(), ConfigError> {
        let paths = &self.cfg.paths;
        if !paths.base.is_dir() {
            return Err(ConfigError::Path(paths.base.clone()));
        }
        let mut inputs = vec![&paths.coastline, &paths.dem, &paths.crop];
        if self.cfg.transects.use_precalculated {
            inputs.extend(paths.transects.as_ref());
        }
        for input in inputs {
            let path = paths.resolve(input);
            if !path.exists() {
                return Err(ConfigError::Path(path));
            }
        }
        Ok(())
    }

    pub fn run(&self, progress_group: &MultiProgress) -> Result<GeneratorReport, Error> {
        let cfg = self.cfg;
        let paths = &cfg.paths;
        let crs = cfg.crs.as_deref();
        cfg.validate()?;
        self.check_inputs()?;
        let layout = self.layout();
        layout.create()?;

        let precomputed = paths.transects.as_ref().map(|p| paths.resolve(p));
        let transects = transect::build(
            &cfg.transects,
            &paths.resolve(&paths.coastline),
            precomputed.as_deref(),
        )?;
        transect::write(&layout.transects(), &transects, crs)?;
        let buffers = transect::buffers(&transects, cfg.transects.buffer_width());
        transect::write_buffers(&layout.buffers(), &buffers, crs)?;

        let tile_mode = TileMode::memmap(cfg.profiles.memmap);
        let tiles = Tiles::new(paths.resolve(&paths.dem), tile_mode)?;
        let dirs = layout.clips();
        let pb = progress_group.add(progress::bar("Sample".to_string(), 0));
        let sample = Sampler::new(&tiles, &dirs).run(&buffers, &pb);
        pb.finish();

        let mut report = GeneratorReport {
            transects: transects.len(),
            sample,
            ..GeneratorReport::default()
        };

        let extractor = Extractor::new(&dirs, cfg.profiles.resolution, tile_mode);
        for tile in tiles.paths() {
            let pb = progress_group.add(progress::bar(
                format!("Profiles {}", tile_name(tile)),
                transects.len() as u64,
            ));
            let extracted = extractor.extract_tile(tile, &transects, &pb);
            extracted.write(&layout.whole(), cfg.csv, crs)?;
            pb.finish();
            report.profiles += extracted.profiles.len();
            report.missing += extracted.missing;
            report.failed += extracted.failed;
        }

        let boundary = Boundary::load(&paths.resolve(&paths.crop))?;
        let pb = progress_group.add(progress::bar("Crop".to_string(), 0));
        report.crop =
            Cropper::new(&boundary, cfg.crop.mode, cfg.csv).run(&layout.whole(), &layout.crop(), &pb)?;
        pb.finish();

        info!(
            "generated {} profiles from {} transects into {:?}",
            report.profiles,
            report.transects,
            layout.root
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::{Generator, Layout};
    use crate::{ConfigError, GeneratorConfig, GeneratorPaths};
    use std::path::PathBuf;

    #[test]
    fn test_layout() {
        let layout = Layout::new("/out");
        assert_eq!(layout.whole(), PathBuf::from("/out/profiles/whole"));
        assert_eq!(layout.crop(), PathBuf::from("/out/profiles/crop"));
        assert_eq!(layout.clips().slope, PathBuf::from("/out/dem/slope"));
    }

    #[test]
    fn test_missing_base_is_fatal() {
        let cfg = GeneratorConfig {
            paths: GeneratorPaths {
                base: PathBuf::from("/no/such/site"),
                coastline: PathBuf::from("coast"),
                transects: None,
                dem: PathBuf::from("dem"),
                crop: PathBuf::from("crop"),
                output: PathBuf::from("out"),
            },
            crs: None,
            transects: Default::default(),
            profiles: Default::default(),
            crop: Default::default(),
            csv: Default::default(),
        };
        assert!(matches!(
            Generator::new(&cfg).check_inputs(),
            Err(ConfigError::Path(path)) if path == PathBuf::from("/no/such/site")
        ));
    }
}
