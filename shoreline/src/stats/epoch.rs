use crate::{layer, ConfigError, Error, StatsError};
use geo::{Geometry, Point};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    str::FromStr,
};

/// A feature point of one profile in one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShorePoint {
    pub profile_id: u32,
    pub point: Point<f64>,
}

/// A named survey: one feature point per profile id.
#[derive(Debug, Clone, PartialEq)]
pub struct Epoch {
    pub label: String,

    /// First four consecutive digits of `label`.
    pub year: i32,

    pub points: Vec<ShorePoint>,
}

impl Epoch {
    pub fn new(label: impl Into<String>, points: Vec<ShorePoint>) -> Result<Self, StatsError> {
        let label = label.into();
        let year = parse_year(&label).ok_or_else(|| StatsError::NoYear(label.clone()))?;
        Ok(Self {
            label,
            year,
            points,
        })
    }

    /// Loads a feature point layer; every feature needs a point
    /// geometry and a `profile_id` property.
    pub fn load(label: impl Into<String>, path: &Path) -> Result<Self, Error> {
        let mut points = Vec::new();
        for (index, (geometry, props)) in layer::features(path)?.into_iter().enumerate() {
            let bad = |field| ConfigError::Feature {
                path: path.to_owned(),
                index,
                field,
            };
            let profile_id = layer::u32_property(&props, "profile_id").ok_or_else(|| bad("profile_id"))?;
            let Geometry::Point(point) = geometry else {
                return Err(bad("geometry").into());
            };
            points.push(ShorePoint { profile_id, point });
        }
        Ok(Self::new(label, points)?)
    }

    /// Returns the first point recorded for `profile_id`.
    pub fn get(&self, profile_id: u32) -> Option<Point<f64>> {
        self.points
            .iter()
            .find(|p| p.profile_id == profile_id)
            .map(|p| p.point)
    }
}

/// Returns the first four consecutive ASCII digits of `label`.
pub fn parse_year(label: &str) -> Option<i32> {
    let bytes = label.as_bytes();
    bytes
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .and_then(|start| label.get(start..start + 4))
        .and_then(|digits| digits.parse().ok())
}

/// Where to find an epoch: `LABEL=PATH`, or a bare `PATH`.
///
/// A bare path is labeled by the nearest path component (file stem
/// first, then parent directories) containing a year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSource {
    pub label: String,
    pub path: PathBuf,
}

impl FromStr for EpochSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        if let Some((label, path)) = s.split_once('=') {
            if label.is_empty() || path.is_empty() {
                return Err(format!("expected LABEL=PATH, got '{s}'"));
            }
            return Ok(Self {
                label: label.to_string(),
                path: PathBuf::from(path),
            });
        }
        let path = PathBuf::from(s);
        let stem = path
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or_default()
            .to_string();
        let label = path
            .iter()
            .rev()
            .filter_map(OsStr::to_str)
            .find(|component| parse_year(component).is_some())
            .map_or(stem, |component| {
                Path::new(component)
                    .file_stem()
                    .and_then(OsStr::to_str)
                    .unwrap_or(component)
                    .to_string()
            });
        Ok(Self { label, path })
    }
}

impl EpochSource {
    /// Loads the epoch; a directory is searched for the
    /// `{line}Points.geojson` layer written by the finder.
    pub fn load(&self, line: &str) -> Result<Epoch, Error> {
        let path = if self.path.is_dir() {
            self.path.join(format!("{line}Points.geojson"))
        } else {
            self.path.clone()
        };
        Epoch::load(self.label.clone(), &path)
    }
}

/// At least two epochs, in selection order, truncated to a common
/// point count.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochSet {
    epochs: Vec<Epoch>,
}

impl EpochSet {
    pub fn new(mut epochs: Vec<Epoch>) -> Result<Self, StatsError> {
        if epochs.len() < 2 {
            return Err(StatsError::InsufficientEpochs(epochs.len()));
        }
        let common = epochs.iter().map(|e| e.points.len()).min().unwrap_or(0);
        for epoch in &mut epochs {
            if epoch.points.len() > common {
                warn!(
                    "epoch {}: truncating {} points to {common}",
                    epoch.label,
                    epoch.points.len()
                );
                epoch.points.truncate(common);
            }
        }
        Ok(Self { epochs })
    }

    pub fn epochs(&self) -> &[Epoch] {
        &self.epochs
    }

    pub fn first(&self) -> &Epoch {
        &self.epochs[0]
    }

    pub fn last(&self) -> &Epoch {
        &self.epochs[self.epochs.len() - 1]
    }

    /// Profile ids of the first epoch, in order, without repeats.
    pub fn profile_ids(&self) -> Vec<u32> {
        let mut ids = Vec::with_capacity(self.first().points.len());
        for p in &self.first().points {
            if !ids.contains(&p.profile_id) {
                ids.push(p.profile_id);
            }
        }
        ids
    }

    /// Profile ids present in both the first and the last epoch.
    pub fn common_ids(&self) -> Vec<u32> {
        let last = self.last();
        self.profile_ids()
            .into_iter()
            .filter(|&id| last.get(id).is_some())
            .collect()
    }

    /// Epoch labels joined with `_`, used to name exported tables.
    pub fn suffix(&self) -> String {
        self.epochs
            .iter()
            .map(|e| e.label.as_str())
            .collect::<Vec<_>>()
            .join("_")
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_year, Epoch, EpochSet, EpochSource, ShorePoint};
    use crate::StatsError;
    use geo::point;
    use std::path::PathBuf;

    fn epoch(label: &str, ids: &[u32]) -> Epoch {
        let points = ids
            .iter()
            .map(|&profile_id| ShorePoint {
                profile_id,
                point: point!(x: f64::from(profile_id), y: 0.0),
            })
            .collect();
        Epoch::new(label, points).unwrap()
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2020"), Some(2020));
        assert_eq!(parse_year("survey_2019_spring"), Some(2019));
        assert_eq!(parse_year("12345"), Some(1234));
        assert_eq!(parse_year("v1_v2"), None);
        assert_eq!(
            Epoch::new("spring", Vec::new()),
            Err(StatsError::NoYear("spring".to_string()))
        );
    }

    #[test]
    fn test_source_parsing() {
        let src: EpochSource = "A2020=out/a/topPoints.geojson".parse().unwrap();
        assert_eq!(src.label, "A2020");
        assert_eq!(src.path, PathBuf::from("out/a/topPoints.geojson"));

        let src: EpochSource = "out/2021/topPoints.geojson".parse().unwrap();
        assert_eq!(src.label, "2021");

        let src: EpochSource = "out/finder_2022.geojson".parse().unwrap();
        assert_eq!(src.label, "finder_2022");

        assert!("=x".parse::<EpochSource>().is_err());
    }

    #[test]
    fn test_set_truncates_and_orders_ids() {
        assert_eq!(
            EpochSet::new(vec![epoch("2020", &[1])]),
            Err(StatsError::InsufficientEpochs(1))
        );
        let set = EpochSet::new(vec![
            epoch("2020", &[3, 1, 2, 4]),
            epoch("2022", &[1, 2, 3]),
            epoch("2024", &[2, 3, 5, 6, 7]),
        ])
        .unwrap();
        assert!(set.epochs().iter().all(|e| e.points.len() == 3));
        assert_eq!(set.profile_ids(), vec![3, 1, 2]);
        assert_eq!(set.common_ids(), vec![3, 2]);
        assert_eq!(set.suffix(), "2020_2022_2024");
    }
}
