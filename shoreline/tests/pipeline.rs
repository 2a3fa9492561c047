use approx::assert_relative_eq;
use indicatif::{MultiProgress, ProgressDrawTarget};
use shoreline::{
    demgrid::{Endian, Grid, Header},
    finder::{FeatureKind, Finder},
    stats::{ChangeReport, EpochSet, EpochSource, Export},
    table::{self, CroppedRow},
    CsvFormat, FinderConfig, Generator, GeneratorConfig, GeneratorPaths, StatsConfig,
};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

const COAST: &str = r#"{
  "type": "FeatureCollection",
  "features": [{
    "type": "Feature",
    "properties": {},
    "geometry": {"type": "LineString", "coordinates": [[20.5, 100.25], [180.5, 100.25]]}
  }]
}"#;

const BOUNDARY: &str = r#"{
  "type": "FeatureCollection",
  "features": [{
    "type": "Feature",
    "properties": {},
    "geometry": {
      "type": "Polygon",
      "coordinates": [[[0, 85], [200, 85], [200, 118], [0, 118], [0, 85]]]
    }
  }]
}"#;

/// A 200 x 200 grid rising 0.2 per unit northward, crossing 0.5 at
/// `waterline`.
fn write_dem(dir: &Path, waterline: f64) {
    let header = Header {
        ncols: 200,
        nrows: 200,
        xllcorner: 0.0,
        yllcorner: 0.0,
        cellsize: 1.0,
        nodata: -9999.0,
        endian: Endian::Little,
    };
    let mut samples = Vec::with_capacity(header.len());
    for row in 0..header.nrows {
        let y = 200.0 - (row as f64 + 0.5);
        for _ in 0..header.ncols {
            samples.push((0.5 + 0.2 * (y - waterline)) as f32);
        }
    }
    fs::create_dir_all(dir).unwrap();
    Grid::new(header, samples)
        .unwrap()
        .write(dir.join("site.flt"))
        .unwrap();
}

fn site(name: &str, waterline: f64) -> GeneratorConfig {
    let base = env::temp_dir().join("shoreline_pipeline").join(name);
    let _ = fs::remove_dir_all(&base);
    fs::create_dir_all(base.join("input")).unwrap();
    fs::write(base.join("input/coast.geojson"), COAST).unwrap();
    fs::write(base.join("input/crop.geojson"), BOUNDARY).unwrap();
    write_dem(&base.join("input/dem"), waterline);
    GeneratorConfig {
        paths: GeneratorPaths {
            base,
            coastline: PathBuf::from("input/coast.geojson"),
            transects: None,
            dem: PathBuf::from("input/dem"),
            crop: PathBuf::from("input/crop.geojson"),
            output: PathBuf::from("output"),
        },
        crs: Some("EPSG:2180".to_string()),
        transects: Default::default(),
        profiles: Default::default(),
        crop: Default::default(),
        csv: CsvFormat::default(),
    }
}

/// Runs the generator and the finder, returning the features
/// directory.
fn survey(cfg: &GeneratorConfig) -> PathBuf {
    let progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
    let generator = Generator::new(cfg);
    let report = generator.run(&progress).unwrap();
    assert_eq!(report.transects, 4);
    assert_eq!(report.sample.written, 4);
    assert_eq!(report.profiles, 4);
    assert_eq!(report.crop.written, 4);
    assert_eq!(report.crop.failed, 0);

    let layout = generator.layout();
    assert!(layout.transects().is_file());
    assert!(layout.buffers().is_file());
    assert!(layout.whole().join("1_whole_site.csv").is_file());
    assert!(layout.whole().join("profiles_site.geojson").is_file());

    let rows: Vec<CroppedRow> =
        table::read(&layout.crop().join("1_crop_site.csv"), cfg.csv).unwrap();
    assert_eq!(rows.len(), 80);
    assert!(rows.iter().any(CroppedRow::in_boundary));
    assert!(!rows.iter().all(CroppedRow::in_boundary));
    // Walks run from water to land.
    assert!(rows[0].elevation < rows[rows.len() - 1].elevation);

    let finder_cfg = FinderConfig::default();
    let found = Finder::new(&finder_cfg, cfg.csv).run(&layout.crop()).unwrap();
    assert_eq!(found.detections.len(), 4);
    for d in &found.detections {
        let f = &d.features;
        assert!(f.first_zero <= f.last_zero && f.last_zero <= f.top);
        assert!(f.bottom <= f.top);
    }
    found.write(&layout.features(), cfg.csv, cfg.crs.as_deref()).unwrap();
    for kind in FeatureKind::ALL {
        assert!(layout.features().join(kind.points_file()).is_file());
        assert!(layout.features().join(kind.line_file()).is_file());
    }
    layout.features()
}

#[test]
fn test_generate_find_and_compare() {
    let early = survey(&site("2020", 100.0));
    let late = survey(&site("2024", 110.0));

    let stats = StatsConfig {
        line: FeatureKind::FirstZero.layer_name().to_string(),
        epochs: vec![
            format!("2020={}", early.display()).parse::<EpochSource>().unwrap(),
            format!("2024={}", late.display()).parse::<EpochSource>().unwrap(),
        ],
    };
    stats.validate().unwrap();
    let epochs = stats
        .epochs
        .iter()
        .map(|source| source.load(&stats.line))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let set = EpochSet::new(epochs).unwrap();
    assert_eq!(set.common_ids(), vec![1, 2, 3, 4]);

    let report = ChangeReport::compute(&set);
    for r in report.nsm.as_ref().unwrap() {
        assert_relative_eq!(r.nsm_distance, 10.0, epsilon = 1e-6);
        assert_eq!(r.direction, 1);
    }
    for r in report.epr.as_ref().unwrap() {
        assert_relative_eq!(r.epr_rate, 2.5, epsilon = 1e-6);
    }
    for r in report.sce.as_ref().unwrap() {
        assert_relative_eq!(r.max_distance, 10.0, epsilon = 1e-6);
        assert_relative_eq!(r.min_distance, 10.0, epsilon = 1e-6);
    }
    for r in report.lrr.as_ref().unwrap() {
        assert_eq!(r.r_squared, 1.0);
        assert_eq!(r.n, 2);
    }

    let out = early.join("stats");
    let written = Export::new(&out, &stats.line, &set, CsvFormat::default())
        .write(&report)
        .unwrap();
    assert_eq!(written.len(), 6);
    assert!(out.join("tidy_stats_firstZero_2020_2024.csv").is_file());
}

#[test]
fn test_short_profiles_are_absent() {
    let cfg = site("short", 100.0);
    let progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
    let generator = Generator::new(&cfg);
    generator.run(&progress).unwrap();

    let finder_cfg = FinderConfig {
        min_profile_points: 1000,
        ..FinderConfig::default()
    };
    let layout = generator.layout();
    let found = Finder::new(&finder_cfg, cfg.csv).run(&layout.crop()).unwrap();
    assert!(found.detections.is_empty());
    assert_eq!(found.skipped.len(), 4);

    found.write(&layout.features(), cfg.csv, None).unwrap();
    let table = fs::read_to_string(layout.features().join("finder.csv")).unwrap();
    assert_eq!(table.lines().count(), 1);
    assert!(table.starts_with("profile_id,method,"));
}
