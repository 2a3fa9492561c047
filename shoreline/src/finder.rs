//! Feature Detector: waterline, base and crest of cropped profiles.

use crate::{
    layer,
    table::{self, CroppedRow, FeatureRow},
    CsvFormat, DataQualityError, Error, FinderConfig, Method,
};
use geo::{LineString, Point};
use log::{error, info, warn};
use serde::Serialize;
use std::{fmt, path::Path};

/// Inclusive range of positions searched in a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub first: usize,
    pub last: usize,
}

impl Window {
    pub fn len(&self) -> usize {
        (self.last + 1).saturating_sub(self.first)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn require(self, need: usize) -> Result<Self, DataQualityError> {
        let have = self.len();
        if have < need {
            Err(DataQualityError::TooFewPoints { have, need })
        } else {
            Ok(self)
        }
    }
}

/// The four feature points of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKind {
    FirstZero,
    LastZero,
    Bottom,
    Top,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 4] = [
        FeatureKind::FirstZero,
        FeatureKind::LastZero,
        FeatureKind::Bottom,
        FeatureKind::Top,
    ];

    /// Layer name stem, e.g. `firstZero`.
    pub fn layer_name(self) -> &'static str {
        match self {
            FeatureKind::FirstZero => "firstZero",
            FeatureKind::LastZero => "lastZero",
            FeatureKind::Bottom => "bottom",
            FeatureKind::Top => "top",
        }
    }

    /// `{kind}Points.geojson`
    pub fn points_file(self) -> String {
        format!("{}Points.geojson", self.layer_name())
    }

    /// `{kind}PointsLine.geojson`
    pub fn line_file(self) -> String {
        format!("{}PointsLine.geojson", self.layer_name())
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.layer_name())
    }
}

/// Feature indices of one profile, as `no_point` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSet {
    pub profile_id: u32,
    pub method: Method,
    pub smoothed: bool,
    pub first_zero: usize,
    pub last_zero: usize,
    pub bottom: usize,
    pub top: usize,
}

impl FeatureSet {
    pub fn get(&self, kind: FeatureKind) -> usize {
        match kind {
            FeatureKind::FirstZero => self.first_zero,
            FeatureKind::LastZero => self.last_zero,
            FeatureKind::Bottom => self.bottom,
            FeatureKind::Top => self.top,
        }
    }

    pub fn row(&self) -> FeatureRow {
        FeatureRow {
            profile_id: self.profile_id,
            method: self.method.into(),
            profile_smooth: self.smoothed,
            first_zero: self.first_zero,
            last_zero: self.last_zero,
            bottom: self.bottom,
            top: self.top,
        }
    }
}

/// Location of one feature point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeaturePoint {
    pub profile_id: u32,
    pub no_point: usize,
    #[serde(skip)]
    pub x: f64,
    #[serde(skip)]
    pub y: f64,
    pub elevation: f64,
}

/// A detected [`FeatureSet`] with its four points, in
/// [`FeatureKind::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub features: FeatureSet,
    pub points: [FeaturePoint; 4],
}

impl Detection {
    pub fn point(&self, kind: FeatureKind) -> &FeaturePoint {
        match kind {
            FeatureKind::FirstZero => &self.points[0],
            FeatureKind::LastZero => &self.points[1],
            FeatureKind::Bottom => &self.points[2],
            FeatureKind::Top => &self.points[3],
        }
    }
}

/// Returns the search window of a cropped profile: from the first
/// in-boundary row through the in-boundary elevation maximum plus
/// `top_buffer`, clamped to the last in-boundary row.
pub fn search_window(rows: &[CroppedRow], top_buffer: usize) -> Result<Window, DataQualityError> {
    let first = rows
        .iter()
        .position(CroppedRow::in_boundary)
        .ok_or(DataQualityError::OutsideBoundary)?;
    let last_inside = rows
        .iter()
        .rposition(CroppedRow::in_boundary)
        .ok_or(DataQualityError::OutsideBoundary)?;
    let crest = (first..=last_inside)
        .filter(|&idx| rows[idx].in_boundary())
        .fold(first, |best, idx| {
            if rows[idx].elevation > rows[best].elevation {
                idx
            } else {
                best
            }
        });
    Ok(Window {
        first,
        last: crest.saturating_add(top_buffer).min(last_inside),
    })
}

/// Returns the first and last positions in `window` where `elevation`
/// crosses `zero`.
///
/// A position crosses if it equals `zero`, or if it and its
/// predecessor lie on opposite sides of `zero`.
pub fn zero_points(elevation: &[f64], window: Window, zero: f64) -> Option<(usize, usize)> {
    let mut crossings = (window.first..=window.last).filter(|&j| {
        elevation[j] == zero
            || (j > window.first
                && elevation[j - 1] != zero
                && (elevation[j - 1] < zero) != (elevation[j] < zero))
    });
    let first = crossings.next()?;
    Some((first, crossings.last().unwrap_or(first)))
}

/// Replaces `elevation` within `window` by its centered moving
/// average of `width` points, truncated at the window's edges.
pub fn smooth(elevation: &mut [f64], window: Window, width: usize) -> Result<(), DataQualityError> {
    if width == 0 || window.len() < width {
        return Err(DataQualityError::Smoothing {
            have: window.len(),
            need: width,
        });
    }
    let half = width / 2;
    let source = elevation[window.first..=window.last].to_vec();
    for (idx, value) in elevation[window.first..=window.last].iter_mut().enumerate() {
        let lo = idx.saturating_sub(half);
        let hi = (idx + half).min(source.len() - 1);
        #[allow(clippy::cast_precision_loss)]
        let mean = source[lo..=hi].iter().sum::<f64>() / (hi - lo + 1) as f64;
        *value = mean;
    }
    Ok(())
}

/// Returns `(bottom, top)` positions within `window`.
///
/// The crest is the first elevation maximum; `top` is the crest
/// moved `top_buffer` points onward, clamped to the window end.
/// `bottom` is the first elevation minimum between the window start
/// and `top`.
pub fn main_points(elevation: &[f64], window: Window, top_buffer: usize) -> (usize, usize) {
    let argmax = (window.first..=window.last).fold(window.first, |best, idx| {
        if elevation[idx] > elevation[best] {
            idx
        } else {
            best
        }
    });
    let top = argmax.saturating_add(top_buffer).min(window.last);
    let bottom = (window.first..=top).fold(window.first, |best, idx| {
        if elevation[idx] < elevation[best] {
            idx
        } else {
            best
        }
    });
    (bottom, top)
}

/// Locates the feature points of one cropped profile.
///
/// `rows` must be ordered by `no_point`. Any stage leaving fewer
/// than `min_profile_points` in the window excludes the profile.
pub fn detect(
    profile_id: u32,
    rows: &[CroppedRow],
    cfg: &FinderConfig,
) -> Result<Detection, DataQualityError> {
    let need = cfg.min_profile_points;
    if rows.len() < need {
        return Err(DataQualityError::TooFewPoints {
            have: rows.len(),
            need,
        });
    }
    let mut elevation: Vec<f64> = rows.iter().map(|row| row.elevation).collect();

    let window = search_window(rows, cfg.top_buffer())?.require(need)?;
    let (first_zero, last_zero) = zero_points(&elevation, window, cfg.elevation_zero)
        .ok_or(DataQualityError::NoWaterline(cfg.elevation_zero))?;
    // Base and crest lie landward of the waterline.
    let window = Window {
        first: window.first.max(last_zero),
        last: window.last,
    }
    .require(need)?;

    if cfg.smooth {
        smooth(&mut elevation, window, cfg.smooth_window)?;
    }

    let (bottom, top) = main_points(&elevation, window, cfg.top_buffer());
    Window {
        first: window.first,
        last: top,
    }
    .require(need)?;
    let bottom = bottom.max(last_zero);

    let point = |idx: usize| FeaturePoint {
        profile_id,
        no_point: rows[idx].no_point,
        x: rows[idx].x_geo,
        y: rows[idx].y_geo,
        elevation: elevation[idx],
    };
    Ok(Detection {
        features: FeatureSet {
            profile_id,
            method: cfg.method,
            smoothed: cfg.smooth,
            first_zero: rows[first_zero].no_point,
            last_zero: rows[last_zero].no_point,
            bottom: rows[bottom].no_point,
            top: rows[top].no_point,
        },
        points: [
            point(first_zero),
            point(last_zero),
            point(bottom),
            point(top),
        ],
    })
}

/// Profiles excluded for data quality reasons.
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    pub profile_id: u32,
    pub reason: DataQualityError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinderReport {
    /// In profile id order.
    pub detections: Vec<Detection>,
    pub skipped: Vec<Skipped>,
    pub failed: usize,
}

impl FinderReport {
    /// Writes `finder.csv`, one point layer per feature kind, and one
    /// line per kind joining its points in profile id order.
    pub fn write(&self, out_dir: &Path, format: CsvFormat, crs: Option<&str>) -> Result<(), Error> {
        std::fs::create_dir_all(out_dir)?;
        let rows: Vec<FeatureRow> = self.detections.iter().map(|d| d.features.row()).collect();
        let table_path = out_dir.join("finder.csv");
        if rows.is_empty() {
            table::write_header(&table_path, FeatureRow::COLUMNS, format)?;
        } else {
            table::write(&table_path, &rows, format)?;
        }

        for kind in FeatureKind::ALL {
            let mut points: Vec<&FeaturePoint> =
                self.detections.iter().map(|d| d.point(kind)).collect();
            points.sort_by_key(|p| p.profile_id);

            let mut features = Vec::with_capacity(points.len());
            for p in &points {
                features.push(layer::feature(&Point::new(p.x, p.y), layer::properties(p)?));
            }
            layer::write(&out_dir.join(kind.points_file()), features, crs)?;

            if points.len() > 1 {
                let line: LineString<f64> = points.iter().map(|p| (p.x, p.y)).collect();
                let mut props = geojson::JsonObject::new();
                props.insert("kind".to_string(), kind.layer_name().into());
                props.insert("points".to_string(), points.len().into());
                layer::write(
                    &out_dir.join(kind.line_file()),
                    vec![layer::feature(&line, props)],
                    crs,
                )?;
            }
        }
        Ok(())
    }
}

pub struct Finder<'a> {
    cfg: &'a FinderConfig,
    format: CsvFormat,
}

impl<'a> Finder<'a> {
    pub fn new(cfg: &'a FinderConfig, format: CsvFormat) -> Self {
        Self { cfg, format }
    }

    /// Detects features in every cropped profile table of `in_dir`.
    pub fn run(&self, in_dir: &Path) -> Result<FinderReport, Error> {
        let mut report = FinderReport::default();
        for path in table::list(in_dir)? {
            let name = table::file_name(&path);
            let Some(profile_id) = table::profile_id(&name) else {
                warn!("{name}: no profile id in file name");
                continue;
            };
            if !self.cfg.is_selected(profile_id) {
                continue;
            }
            let mut rows: Vec<CroppedRow> = match table::read(&path, self.format) {
                Ok(rows) => rows,
                Err(e) => {
                    error!("profile {profile_id}, {name}: {e}");
                    report.failed += 1;
                    continue;
                }
            };
            rows.sort_by_key(|row| row.no_point);
            match detect(profile_id, &rows, self.cfg) {
                Ok(detection) => report.detections.push(detection),
                Err(reason) => {
                    warn!("profile {profile_id} skipped: {reason}");
                    report.skipped.push(Skipped { profile_id, reason });
                }
            }
        }
        info!(
            "found features in {} profiles, {} skipped, {} failed",
            report.detections.len(),
            report.skipped.len(),
            report.failed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        detect, main_points, search_window, smooth, zero_points, FeatureKind, FinderReport, Window,
    };
    use crate::{
        table::{self, CroppedRow, FeatureRow},
        CsvFormat, DataQualityError, FinderConfig, Method,
    };
    use approx::assert_relative_eq;

    fn rows(elevations: &[f64], inside: std::ops::Range<usize>) -> Vec<CroppedRow> {
        elevations
            .iter()
            .enumerate()
            .map(|(i, &elevation)| CroppedRow {
                no_transect: 1,
                length_transect: elevations.len() as f64,
                no_point: i,
                dem: "dem.flt".to_string(),
                x_image: 0,
                y_image: i as i64,
                x_geo: i as f64,
                y_geo: 100.0,
                elevation,
                slope: 0.0,
                boundary_id: inside.contains(&i).then_some(1),
            })
            .collect()
    }

    /// Water up to index 4, the waterline and base at index 5, a crest
    /// at index 25, then a gentle landward slope to index 39.
    fn beach() -> Vec<f64> {
        let mut e = vec![-1.0, -0.8, -0.6, -0.4, -0.2];
        e.extend((5..=25).map(|i| 0.5 + (i - 5) as f64 * 0.4));
        e.extend((26..40).map(|i| 8.5 - (i - 25) as f64 * 0.1));
        e
    }

    #[test]
    fn test_zero_points_tie_counts() {
        let e = [0.0, 0.4, 0.5, 0.6, 0.3, 0.9];
        let w = Window { first: 0, last: 5 };
        assert_eq!(zero_points(&e, w, 0.5), Some((2, 5)));
        assert_eq!(zero_points(&e, w, 2.0), None);
        // A single crossing gives equal indices.
        assert_eq!(zero_points(&[0.0, 1.0, 2.0], Window { first: 0, last: 2 }, 0.5), Some((1, 1)));
    }

    #[test]
    fn test_search_window_clamps_buffer() {
        let e = beach();
        let r = rows(&e, 2..30);
        assert_eq!(search_window(&r, 0).unwrap(), Window { first: 2, last: 25 });
        assert_eq!(search_window(&r, 10).unwrap(), Window { first: 2, last: 29 });
        let outside = rows(&e, 0..0);
        assert_eq!(search_window(&outside, 10), Err(DataQualityError::OutsideBoundary));
    }

    #[test]
    fn test_main_points() {
        let e = beach();
        let w = Window { first: 5, last: 39 };
        assert_eq!(main_points(&e, w, 0), (5, 25));
        assert_eq!(main_points(&e, w, 10), (5, 35));
        assert_eq!(main_points(&e, w, 100), (5, 39));
    }

    #[test]
    fn test_detect_plain_extrema() {
        let cfg = FinderConfig {
            method: Method::Extremum,
            ..FinderConfig::default()
        };
        let e = beach();
        let detection = detect(3, &rows(&e, 0..40), &cfg).unwrap();
        let f = detection.features;
        assert_eq!((f.first_zero, f.last_zero), (5, 5));
        assert_eq!((f.bottom, f.top), (5, 25));
        assert!(!f.smoothed);
        assert_relative_eq!(detection.points[3].elevation, 8.5, epsilon = 1e-9);
        assert_eq!(detection.points[0].x, 5.0);
    }

    #[test]
    fn test_detect_crest_buffer() {
        let e = beach();
        let f = detect(3, &rows(&e, 0..40), &FinderConfig::default())
            .unwrap()
            .features;
        assert_eq!(f.top, 35);
        assert!(f.first_zero <= f.last_zero && f.last_zero <= f.top);
        assert!(f.last_zero <= f.bottom && f.bottom <= f.top);
    }

    #[test]
    fn test_detect_excludes_short_profiles() {
        let e = [-1.0, 0.0, 1.0, 2.0, 3.0];
        let err = detect(1, &rows(&e, 0..5), &FinderConfig::default()).unwrap_err();
        assert_eq!(err, DataQualityError::TooFewPoints { have: 5, need: 10 });
    }

    #[test]
    fn test_detect_without_waterline() {
        let e = vec![2.0; 20];
        let err = detect(1, &rows(&e, 0..20), &FinderConfig::default()).unwrap_err();
        assert_eq!(err, DataQualityError::NoWaterline(0.5));
    }

    #[test]
    fn test_smoothing() {
        let mut e = vec![0.0, 0.0, 3.0, 0.0, 0.0, 9.0];
        smooth(&mut e, Window { first: 0, last: 4 }, 3).unwrap();
        assert_eq!(&e[..], &[0.0, 1.0, 1.0, 1.0, 0.0, 9.0]);
        let err = smooth(&mut e, Window { first: 0, last: 1 }, 5).unwrap_err();
        assert_eq!(err, DataQualityError::Smoothing { have: 2, need: 5 });
    }

    #[test]
    fn test_smoothing_failure_skips_profile() {
        let cfg = FinderConfig {
            smooth: true,
            smooth_window: 50,
            ..FinderConfig::default()
        };
        let e = beach();
        assert!(matches!(
            detect(1, &rows(&e, 0..40), &cfg),
            Err(DataQualityError::Smoothing { .. })
        ));
    }

    #[test]
    fn test_empty_report_writes_headers() {
        let dir = std::env::temp_dir().join(format!("shoreline-{}-finder-empty", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let format = CsvFormat { sep: ';' };
        FinderReport::default().write(&dir, format, None).unwrap();

        let raw = std::fs::read_to_string(dir.join("finder.csv")).unwrap();
        assert_eq!(
            raw,
            "profile_id;method;profile_smooth;first_zero;last_zero;bottom;top\n"
        );
        let rows: Vec<FeatureRow> = table::read(&dir.join("finder.csv"), format).unwrap();
        assert!(rows.is_empty());
        for kind in FeatureKind::ALL {
            assert!(dir.join(kind.points_file()).is_file());
        }
        std::fs::remove_dir_all(dir).unwrap();
    }
}
