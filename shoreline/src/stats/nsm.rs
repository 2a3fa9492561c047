//! Net Shoreline Movement.

use super::{EpochSet, Metric};
use crate::StatsError;
use geo::EuclideanDistance;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NsmRecord {
    pub profile_id: u32,

    /// Distance between the first and last epoch's points, signed by
    /// `direction`.
    pub nsm_distance: f64,

    /// `1` if the last point lies north of the first, else `-1`.
    pub direction: i8,
}

impl NsmRecord {
    pub fn distance(&self) -> f64 {
        self.nsm_distance.abs()
    }
}

impl Metric for NsmRecord {
    const METHOD: &'static str = "NSM";
    const COLUMNS: &'static [&'static str] = &["nsm_distance", "direction"];
    const TIDY: &'static [&'static str] = &["nsm_distance"];

    fn profile_id(&self) -> u32 {
        self.profile_id
    }

    fn values(&self) -> Vec<f64> {
        vec![self.nsm_distance, f64::from(self.direction)]
    }

    fn fields(&self) -> Vec<String> {
        vec![format!("{:?}", self.nsm_distance), self.direction.to_string()]
    }

    fn rate(&self) -> f64 {
        self.nsm_distance
    }
}

/// Movement between the first and last epoch for every profile
/// present in both.
pub fn compute(set: &EpochSet) -> Result<Vec<NsmRecord>, StatsError> {
    let (first, last) = (set.first(), set.last());
    let records: Vec<NsmRecord> = set
        .common_ids()
        .into_iter()
        .filter_map(|profile_id| {
            let (a, b) = (first.get(profile_id)?, last.get(profile_id)?);
            let direction: i8 = if b.y() > a.y() { 1 } else { -1 };
            Some(NsmRecord {
                profile_id,
                nsm_distance: f64::from(direction) * a.euclidean_distance(&b),
                direction,
            })
        })
        .collect();
    if records.is_empty() {
        Err(StatsError::NoCommonProfiles)
    } else {
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::compute;
    use crate::{
        stats::{Epoch, EpochSet, ShorePoint},
        StatsError,
    };
    use approx::assert_relative_eq;
    use geo::point;

    fn epoch(label: &str, id: u32, x: f64, y: f64) -> Epoch {
        Epoch::new(
            label,
            vec![ShorePoint {
                profile_id: id,
                point: point!(x: x, y: y),
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_southward_is_negative() {
        let set = EpochSet::new(vec![epoch("2010", 1, 0.0, 0.0), epoch("2015", 1, 6.0, -8.0)]).unwrap();
        let records = compute(&set).unwrap();
        assert_relative_eq!(records[0].nsm_distance, -10.0);
        assert_relative_eq!(records[0].distance(), 10.0);
        assert_eq!(records[0].direction, -1);
    }

    #[test]
    fn test_pure_eastward_counts_as_negative() {
        let set = EpochSet::new(vec![epoch("2010", 1, 0.0, 0.0), epoch("2015", 1, 3.0, 0.0)]).unwrap();
        assert_eq!(compute(&set).unwrap()[0].direction, -1);
    }

    #[test]
    fn test_no_common_profiles() {
        let set = EpochSet::new(vec![epoch("2010", 1, 0.0, 0.0), epoch("2015", 2, 0.0, 0.0)]).unwrap();
        assert_eq!(compute(&set), Err(StatsError::NoCommonProfiles));
    }
}
