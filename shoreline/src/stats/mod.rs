//! Change-Statistics Engine: shoreline change between epochs.
//!
//! Every metric is keyed by profile id and computed from the matching
//! feature points of the selected epochs. A metric that cannot be
//! computed is reported as a [`StatsError`], never as zero.

mod epoch;
pub mod epr;
pub mod export;
pub mod lrr;
pub mod nsm;
pub mod sce;
mod summary;

pub use self::{
    epoch::{parse_year, Epoch, EpochSet, EpochSource, ShorePoint},
    epr::EprRecord,
    export::Export,
    lrr::LrrRecord,
    nsm::NsmRecord,
    sce::SceRecord,
    summary::{Extreme, FitSummary, Summary, Trend},
};
use crate::StatsError;

/// A per-profile record of one change metric.
pub trait Metric {
    /// Method tag written to every exported row.
    const METHOD: &'static str;

    /// Value columns, in export order.
    const COLUMNS: &'static [&'static str];

    /// Columns repeated in the long (tidy) table.
    const TIDY: &'static [&'static str];

    fn profile_id(&self) -> u32;

    /// One value per [`Metric::COLUMNS`] entry.
    fn values(&self) -> Vec<f64>;

    /// The value summarized into erosional/accretional subsets.
    fn rate(&self) -> f64;

    /// Values formatted for export.
    fn fields(&self) -> Vec<String> {
        self.values().iter().map(|v| format!("{v:?}")).collect()
    }

    /// Returns the value of `column`, if this metric has it.
    fn value(&self, column: &str) -> Option<f64> {
        Self::COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|idx| self.values().get(idx).copied())
    }
}

/// All four metrics for one epoch set.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeReport {
    pub sce: Result<Vec<SceRecord>, StatsError>,
    pub nsm: Result<Vec<NsmRecord>, StatsError>,
    pub lrr: Result<Vec<LrrRecord>, StatsError>,
    pub epr: Result<Vec<EprRecord>, StatsError>,
}

impl ChangeReport {
    /// Computes every metric independently; one failing metric does
    /// not affect the others.
    pub fn compute(set: &EpochSet) -> Self {
        Self {
            sce: sce::compute(set),
            nsm: nsm::compute(set),
            lrr: lrr::compute(set),
            epr: epr::compute(set),
        }
    }

    /// Summaries of the available metrics, in SCE, NSM, LRR, EPR
    /// order.
    pub fn summaries(&self) -> Vec<Summary> {
        let mut out = Vec::with_capacity(4);
        if let Ok(records) = &self.sce {
            out.extend(Summary::new(records));
        }
        if let Ok(records) = &self.nsm {
            out.extend(Summary::new(records));
        }
        if let Ok(records) = &self.lrr {
            out.extend(Summary::new(records).map(|s| s.with_fit(FitSummary::new(records))));
        }
        if let Ok(records) = &self.epr {
            out.extend(Summary::new(records));
        }
        out
    }

    /// `(method, error)` for every metric that could not be computed.
    pub fn unavailable(&self) -> Vec<(&'static str, &StatsError)> {
        let mut out = Vec::new();
        if let Err(e) = &self.sce {
            out.push((SceRecord::METHOD, e));
        }
        if let Err(e) = &self.nsm {
            out.push((NsmRecord::METHOD, e));
        }
        if let Err(e) = &self.lrr {
            out.push((LrrRecord::METHOD, e));
        }
        if let Err(e) = &self.epr {
            out.push((EprRecord::METHOD, e));
        }
        out
    }
}
