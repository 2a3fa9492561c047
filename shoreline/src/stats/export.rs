//! CSV tables of computed change metrics.

use super::{ChangeReport, EpochSet, Metric};
use crate::{table, CsvFormat, Error};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// One profile of the wide table; metrics missing for a profile are
/// left empty.
#[derive(Debug, Default, Serialize)]
struct MergedRow<'a> {
    profile_id: u32,
    max_distance: Option<f64>,
    min_distance: Option<f64>,
    nsm_distance: Option<f64>,
    lrr_rate: Option<f64>,
    n: Option<usize>,
    epr_rate: Option<f64>,
    line: &'a str,
    from: &'a str,
    to: &'a str,
}

/// One value of the long table.
#[derive(Debug, Serialize)]
struct TidyRow<'a> {
    profile_id: u32,
    value: f64,
    metric: &'static str,
    method: &'static str,
    line: &'a str,
    from: &'a str,
    to: &'a str,
}

/// Writes the tables of one epoch comparison into `dir`.
#[derive(Debug, Clone)]
pub struct Export {
    dir: PathBuf,
    line: String,
    from: String,
    to: String,
    suffix: String,
    csv: CsvFormat,
}

impl Export {
    /// `line` is the feature kind compared (e.g. `top`).
    pub fn new(dir: &Path, line: &str, set: &EpochSet, csv: CsvFormat) -> Self {
        Self {
            dir: dir.to_owned(),
            line: line.to_string(),
            from: set.first().label.clone(),
            to: set.last().label.clone(),
            suffix: set.suffix(),
            csv,
        }
    }

    /// `{dir}/{stem}_{line}_{suffix}.csv`
    pub fn path(&self, stem: &str) -> PathBuf {
        self.dir
            .join(format!("{stem}_{}_{}.csv", self.line, self.suffix))
    }

    /// Writes every available metric table plus the merged and tidy
    /// tables, returning the written paths.
    pub fn write(&self, report: &ChangeReport) -> Result<Vec<PathBuf>, Error> {
        fs::create_dir_all(&self.dir)?;
        let mut written = Vec::with_capacity(6);
        if let Ok(records) = &report.sce {
            written.push(self.metric(records)?);
        }
        if let Ok(records) = &report.nsm {
            written.push(self.metric(records)?);
        }
        if let Ok(records) = &report.lrr {
            written.push(self.metric(records)?);
        }
        if let Ok(records) = &report.epr {
            written.push(self.metric(records)?);
        }
        written.push(self.merged(report)?);
        written.push(self.tidy(report)?);
        Ok(written)
    }

    /// One row per profile: `profile_id`, the metric columns, then
    /// `method, line, from, to`.
    pub fn metric<M: Metric>(&self, records: &[M]) -> Result<PathBuf, Error> {
        let path = self.path(&M::METHOD.to_lowercase());
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(self.csv.delimiter()?)
            .from_path(&path)?;
        let mut header = vec!["profile_id"];
        header.extend_from_slice(M::COLUMNS);
        header.extend_from_slice(&["method", "line", "from", "to"]);
        wtr.write_record(&header)?;
        for r in records {
            let mut record = vec![r.profile_id().to_string()];
            record.extend(r.fields());
            record.extend([
                M::METHOD.to_string(),
                self.line.clone(),
                self.from.clone(),
                self.to.clone(),
            ]);
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(path)
    }

    /// Outer join of every metric on `profile_id`.
    pub fn merged(&self, report: &ChangeReport) -> Result<PathBuf, Error> {
        let blank = |profile_id| MergedRow {
            profile_id,
            line: &self.line,
            from: &self.from,
            to: &self.to,
            ..MergedRow::default()
        };
        let mut rows: BTreeMap<u32, MergedRow> = BTreeMap::new();
        for r in report.sce.iter().flatten() {
            let row = rows.entry(r.profile_id).or_insert_with(|| blank(r.profile_id));
            row.max_distance = Some(r.max_distance);
            row.min_distance = Some(r.min_distance);
        }
        for r in report.nsm.iter().flatten() {
            let row = rows.entry(r.profile_id).or_insert_with(|| blank(r.profile_id));
            row.nsm_distance = Some(r.nsm_distance);
        }
        for r in report.lrr.iter().flatten() {
            let row = rows.entry(r.profile_id).or_insert_with(|| blank(r.profile_id));
            row.lrr_rate = Some(r.lrr_rate);
            row.n = Some(r.n);
        }
        for r in report.epr.iter().flatten() {
            let row = rows.entry(r.profile_id).or_insert_with(|| blank(r.profile_id));
            row.epr_rate = Some(r.epr_rate);
        }
        let path = self.path("merged_stats");
        table::write(&path, rows.values(), self.csv)?;
        Ok(path)
    }

    /// Long table of the headline values, LRR, EPR, SCE then NSM.
    pub fn tidy(&self, report: &ChangeReport) -> Result<PathBuf, Error> {
        let mut rows = Vec::new();
        self.tidy_rows(&report.lrr, &mut rows);
        self.tidy_rows(&report.epr, &mut rows);
        self.tidy_rows(&report.sce, &mut rows);
        self.tidy_rows(&report.nsm, &mut rows);
        let path = self.path("tidy_stats");
        table::write(&path, &rows, self.csv)?;
        Ok(path)
    }

    fn tidy_rows<'a, M: Metric, E>(
        &'a self,
        records: &Result<Vec<M>, E>,
        rows: &mut Vec<TidyRow<'a>>,
    ) {
        for r in records.iter().flatten() {
            for &column in M::TIDY {
                if let Some(value) = r.value(column) {
                    rows.push(TidyRow {
                        profile_id: r.profile_id(),
                        value,
                        metric: column,
                        method: M::METHOD,
                        line: &self.line,
                        from: &self.from,
                        to: &self.to,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Export;
    use crate::{
        stats::{ChangeReport, Epoch, EpochSet, ShorePoint},
        CsvFormat,
    };
    use geo::point;
    use std::{env, fs};

    fn set() -> EpochSet {
        let epoch = |label: &str, ids: &[u32], dy: f64| {
            let points = ids
                .iter()
                .map(|&profile_id| ShorePoint {
                    profile_id,
                    point: point!(x: f64::from(profile_id), y: dy),
                })
                .collect();
            Epoch::new(label, points).unwrap()
        };
        EpochSet::new(vec![
            epoch("2019", &[1, 2], 0.0),
            epoch("2021", &[1, 3], -2.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_writes_every_table() {
        let dir = env::temp_dir().join("shoreline_stats_export");
        let _ = fs::remove_dir_all(&dir);
        let set = set();
        let export = Export::new(&dir, "top", &set, CsvFormat::default());
        let report = ChangeReport::compute(&set);
        let written = export.write(&report).unwrap();
        assert_eq!(written.len(), 6);
        assert_eq!(written[0], dir.join("sce_top_2019_2021.csv"));

        let nsm = fs::read_to_string(dir.join("nsm_top_2019_2021.csv")).unwrap();
        let mut lines = nsm.lines();
        assert_eq!(
            lines.next(),
            Some("profile_id,nsm_distance,direction,method,line,from,to")
        );
        assert_eq!(lines.next(), Some("1,-2.0,-1,NSM,top,2019,2021"));
        assert_eq!(lines.next(), None);

        let merged = fs::read_to_string(dir.join("merged_stats_top_2019_2021.csv")).unwrap();
        let mut lines = merged.lines();
        assert_eq!(
            lines.next(),
            Some("profile_id,max_distance,min_distance,nsm_distance,lrr_rate,n,epr_rate,line,from,to")
        );
        assert_eq!(lines.next(), Some("1,2.0,2.0,-2.0,-1.0,2,-1.0,top,2019,2021"));

        let tidy = fs::read_to_string(dir.join("tidy_stats_top_2019_2021.csv")).unwrap();
        let rows: Vec<&str> = tidy.lines().skip(1).collect();
        assert_eq!(
            rows,
            vec![
                "1,-1.0,lrr_rate,LRR,top,2019,2021",
                "1,-1.0,epr_rate,EPR,top,2019,2021",
                "1,2.0,max_distance,SCE,top,2019,2021",
                "1,2.0,min_distance,SCE,top,2019,2021",
                "1,-2.0,nsm_distance,NSM,top,2019,2021",
            ]
        );
        fs::remove_dir_all(&dir).unwrap();
    }
}
