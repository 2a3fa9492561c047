//! End Point Rate.

use super::{nsm, EpochSet, Metric};
use crate::StatsError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EprRecord {
    pub profile_id: u32,

    /// Signed net movement per year.
    pub epr_rate: f64,
}

impl Metric for EprRecord {
    const METHOD: &'static str = "EPR";
    const COLUMNS: &'static [&'static str] = &["epr_rate"];
    const TIDY: &'static [&'static str] = &["epr_rate"];

    fn profile_id(&self) -> u32 {
        self.profile_id
    }

    fn values(&self) -> Vec<f64> {
        vec![self.epr_rate]
    }

    fn rate(&self) -> f64 {
        self.epr_rate
    }
}

/// Net movement divided by the years elapsed between the first and
/// last epoch.
pub fn compute(set: &EpochSet) -> Result<Vec<EprRecord>, StatsError> {
    let (first, last) = (set.first().year, set.last().year);
    let years = (last - first).abs();
    if years == 0 {
        return Err(StatsError::DivisionByZeroYears(first));
    }
    let years = f64::from(years);
    Ok(nsm::compute(set)?
        .into_iter()
        .map(|r| EprRecord {
            profile_id: r.profile_id,
            epr_rate: r.nsm_distance / years,
        })
        .collect())
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

    fn epoch(label: &str, y: f64) -> Epoch {
        Epoch::new(
            label,
            vec![ShorePoint {
                profile_id: 7,
                point: point!(x: 0.0, y: y),
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_rate_keeps_sign() {
        let set = EpochSet::new(vec![epoch("2000", 20.0), epoch("2008", 0.0)]).unwrap();
        let records = compute(&set).unwrap();
        assert_eq!(records[0].profile_id, 7);
        assert_relative_eq!(records[0].epr_rate, -2.5);
    }

    #[test]
    fn test_reversed_epoch_order_uses_elapsed_years() {
        let set = EpochSet::new(vec![epoch("2008", 0.0), epoch("2000", 20.0)]).unwrap();
        assert_relative_eq!(compute(&set).unwrap()[0].epr_rate, 2.5);
    }

    #[test]
    fn test_same_year() {
        let set = EpochSet::new(vec![epoch("2019-03", 0.0), epoch("2019-09", 1.0)]).unwrap();
        assert_eq!(compute(&set), Err(StatsError::DivisionByZeroYears(2019)));
    }
}
