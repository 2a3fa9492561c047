//! Shoreline Change Envelope.

use super::{EpochSet, Metric};
use crate::StatsError;
use geo::{EuclideanDistance, Point};
use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceRecord {
    pub profile_id: u32,

    /// Largest distance between any two epochs' points.
    pub max_distance: f64,

    /// Smallest distance between any two epochs' points.
    pub min_distance: f64,
}

impl Metric for SceRecord {
    const METHOD: &'static str = "SCE";
    const COLUMNS: &'static [&'static str] = &["max_distance", "min_distance"];
    const TIDY: &'static [&'static str] = &["max_distance", "min_distance"];

    fn profile_id(&self) -> u32 {
        self.profile_id
    }

    fn values(&self) -> Vec<f64> {
        vec![self.max_distance, self.min_distance]
    }

    fn rate(&self) -> f64 {
        self.max_distance
    }
}

/// For every profile of the first epoch seen in at least two
/// epochs, the extremes of all pairwise point distances.
pub fn compute(set: &EpochSet) -> Result<Vec<SceRecord>, StatsError> {
    let mut records = Vec::new();
    for profile_id in set.profile_ids() {
        let points: Vec<Point<f64>> = set.epochs().iter().filter_map(|e| e.get(profile_id)).collect();
        if points.len() < 2 {
            continue;
        }
        let (min_distance, max_distance) = points
            .iter()
            .tuple_combinations()
            .map(|(a, b)| a.euclidean_distance(b))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
                (lo.min(d), hi.max(d))
            });
        records.push(SceRecord {
            profile_id,
            max_distance,
            min_distance,
        });
    }
    if records.is_empty() {
        Err(StatsError::NoData(SceRecord::METHOD))
    } else {
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::compute;
    use crate::stats::{Epoch, EpochSet, ShorePoint};
    use approx::assert_relative_eq;
    use geo::point;

    fn epoch(label: &str, points: &[(u32, f64, f64)]) -> Epoch {
        let points = points
            .iter()
            .map(|&(profile_id, x, y)| ShorePoint {
                profile_id,
                point: point!(x: x, y: y),
            })
            .collect();
        Epoch::new(label, points).unwrap()
    }

    #[test]
    fn test_envelope_over_three_epochs() {
        let set = EpochSet::new(vec![
            epoch("2018", &[(1, 0.0, 0.0), (2, 0.0, 0.0)]),
            epoch("2020", &[(1, 3.0, 4.0), (9, 0.0, 0.0)]),
            epoch("2022", &[(1, 0.0, 1.0), (2, 0.0, 0.0)]),
        ])
        .unwrap();
        let records = compute(&set).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].profile_id, 1);
        assert_relative_eq!(records[0].max_distance, 5.0);
        assert_relative_eq!(records[0].min_distance, 1.0);
        // Profile 2 is missing in 2020 but still has two epochs.
        assert_eq!(records[1].profile_id, 2);
        assert_eq!(records[1].max_distance, 0.0);
        assert!(records.iter().all(|r| r.max_distance >= r.min_distance && r.min_distance >= 0.0));
    }
}
