//! Linear Regression Rate.

use super::{EpochSet, Metric};
use crate::StatsError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LrrRecord {
    pub profile_id: u32,

    /// Least-squares slope of northing against year.
    pub lrr_rate: f64,

    /// Coefficient of determination of the fit.
    pub r_squared: f64,

    /// Number of observations.
    pub n: usize,
}

impl Metric for LrrRecord {
    const METHOD: &'static str = "LRR";
    const COLUMNS: &'static [&'static str] = &["lrr_rate", "r_squared", "n"];
    const TIDY: &'static [&'static str] = &["lrr_rate"];

    fn profile_id(&self) -> u32 {
        self.profile_id
    }

    fn values(&self) -> Vec<f64> {
        #[allow(clippy::cast_precision_loss)]
        let n = self.n as f64;
        vec![self.lrr_rate, self.r_squared, n]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            format!("{:?}", self.lrr_rate),
            format!("{:?}", self.r_squared),
            self.n.to_string(),
        ]
    }

    fn rate(&self) -> f64 {
        self.lrr_rate
    }
}

/// Ordinary least squares fit of `(x, y)` pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Fits a line through `observations`.
///
/// Returns `None` unless at least two distinct `x` values are
/// present. Two observations always fit exactly (`r_squared == 1`),
/// as does any set with no variance left to explain.
pub fn fit(observations: &[(f64, f64)]) -> Option<Fit> {
    if observations.len() < 2 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = observations.len() as f64;
    let mean_x = observations.iter().map(|o| o.0).sum::<f64>() / n;
    let mean_y = observations.iter().map(|o| o.1).sum::<f64>() / n;
    let (sxx, sxy) = observations.iter().fold((0.0, 0.0), |(sxx, sxy), &(x, y)| {
        let dx = x - mean_x;
        (sxx + dx * dx, sxy + dx * (y - mean_y))
    });
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if observations.len() == 2 {
        1.0
    } else {
        let (ss_res, ss_tot) = observations.iter().fold((0.0, 0.0), |(res, tot), &(x, y)| {
            let e = y - (intercept + slope * x);
            (res + e * e, tot + (y - mean_y) * (y - mean_y))
        });
        if ss_tot == 0.0 {
            1.0
        } else {
            1.0 - ss_res / ss_tot
        }
    };
    Some(Fit {
        slope,
        intercept,
        r_squared,
    })
}

/// Regression rate of northing over year for every profile of the
/// first epoch observed in at least two distinct years.
pub fn compute(set: &EpochSet) -> Result<Vec<LrrRecord>, StatsError> {
    let mut records = Vec::new();
    for profile_id in set.profile_ids() {
        let observations: Vec<(f64, f64)> = set
            .epochs()
            .iter()
            .filter_map(|e| e.get(profile_id).map(|p| (f64::from(e.year), p.y())))
            .collect();
        if let Some(fit) = fit(&observations) {
            records.push(LrrRecord {
                profile_id,
                lrr_rate: fit.slope,
                r_squared: fit.r_squared,
                n: observations.len(),
            });
        }
    }
    if records.is_empty() {
        Err(StatsError::NoData(LrrRecord::METHOD))
    } else {
        Ok(records)
    }
}
