use super::{LrrRecord, Metric};
use std::fmt;

/// A record holding an extreme value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extreme {
    pub profile_id: u32,
    pub value: f64,
}

/// The records on one side of zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Trend {
    pub count: usize,

    /// Share of all records, in percent.
    pub percentage: f64,

    pub mean: Option<f64>,

    /// The record furthest from zero.
    pub extreme: Option<Extreme>,
}

impl Trend {
    #[allow(clippy::cast_precision_loss)]
    fn new(records: impl Iterator<Item = Extreme>, total: usize) -> Self {
        let mut trend = Self::default();
        let mut sum = 0.0;
        for r in records {
            trend.count += 1;
            sum += r.value;
            if trend.extreme.map_or(true, |e| r.value.abs() > e.value.abs()) {
                trend.extreme = Some(r);
            }
        }
        if trend.count > 0 {
            trend.mean = Some(sum / trend.count as f64);
            trend.percentage = 100.0 * trend.count as f64 / total as f64;
        }
        trend
    }
}

/// Fit quality of the regression rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSummary {
    pub mean_r_squared: f64,
    pub mean_n: f64,
}

impl FitSummary {
    pub fn new(records: &[LrrRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let (len, n) = (
            records.len() as f64,
            records.iter().map(|r| r.n).sum::<usize>() as f64,
        );
        Some(Self {
            mean_r_squared: records.iter().map(|r| r.r_squared).sum::<f64>() / len,
            mean_n: n / len,
        })
    }
}

/// Aggregate of one metric over every profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub method: &'static str,
    pub total: usize,
    pub mean: f64,
    pub max: Extreme,
    pub min: Extreme,

    /// Records with a negative rate.
    pub erosional: Trend,

    /// Records with a positive rate.
    pub accretional: Trend,

    pub fit: Option<FitSummary>,
}

impl Summary {
    /// Summarizes `records` by their [`Metric::rate`]; `None` if empty.
    pub fn new<M: Metric>(records: &[M]) -> Option<Self> {
        let first = records.first()?;
        let seed = Extreme {
            profile_id: first.profile_id(),
            value: first.rate(),
        };
        let (mut max, mut min, mut sum) = (seed, seed, 0.0);
        for r in records {
            let value = r.rate();
            sum += value;
            if value > max.value {
                max = Extreme {
                    profile_id: r.profile_id(),
                    value,
                };
            }
            if value < min.value {
                min = Extreme {
                    profile_id: r.profile_id(),
                    value,
                };
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = sum / records.len() as f64;
        let extremes = || {
            records.iter().map(|r| Extreme {
                profile_id: r.profile_id(),
                value: r.rate(),
            })
        };
        Some(Self {
            method: M::METHOD,
            total: records.len(),
            mean,
            max,
            min,
            erosional: Trend::new(extremes().filter(|e| e.value < 0.0), records.len()),
            accretional: Trend::new(extremes().filter(|e| e.value > 0.0), records.len()),
            fit: None,
        })
    }

    pub fn with_fit(self, fit: Option<FitSummary>) -> Self {
        Self { fit, ..self }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} over {} profiles", self.method, self.total)?;
        writeln!(f, "  mean: {:.3}", self.mean)?;
        writeln!(
            f,
            "  max:  {:.3} (profile {})",
            self.max.value, self.max.profile_id
        )?;
        writeln!(
            f,
            "  min:  {:.3} (profile {})",
            self.min.value, self.min.profile_id
        )?;
        for (name, trend) in [("erosional", self.erosional), ("accretional", self.accretional)] {
            match (trend.mean, trend.extreme) {
                (Some(mean), Some(extreme)) => writeln!(
                    f,
                    "  {name}: {} ({:.1}%), mean {mean:.3}, extreme {:.3} (profile {})",
                    trend.count, trend.percentage, extreme.value, extreme.profile_id
                )?,
                _ => writeln!(f, "  {name}: 0")?,
            }
        }
        if let Some(fit) = self.fit {
            writeln!(
                f,
                "  mean r2: {:.3}, mean n: {:.1}",
                fit.mean_r_squared, fit.mean_n
            )?;
        }
        Ok(())
    }
}
