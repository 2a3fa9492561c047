use crate::options::Stats;
use anyhow::Result;
use log::warn;
use shoreline::{
    stats::{ChangeReport, EpochSet, Export},
    CsvFormat, StatsConfig,
};

impl Stats {
    pub fn run(&self) -> Result<()> {
        let cfg = StatsConfig {
            line: self.line.clone(),
            epochs: self.epochs.clone(),
        };
        cfg.validate()?;
        let epochs = cfg
            .epochs
            .iter()
            .map(|source| source.load(&cfg.line))
            .collect::<Result<Vec<_>, _>>()?;
        let set = EpochSet::new(epochs)?;
        let report = ChangeReport::compute(&set);

        println!(
            "{} line, epochs {}",
            cfg.line,
            set.epochs()
                .iter()
                .map(|e| e.label.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        for summary in report.summaries() {
            print!("{summary}");
        }
        for (method, e) in report.unavailable() {
            warn!("{method} unavailable: {e}");
            println!("{method}: unavailable, {e}");
        }

        if let Some(out_dir) = &self.out_dir {
            let export = Export::new(out_dir, &cfg.line, &set, CsvFormat { sep: self.sep });
            for path in export.write(&report)? {
                println!("wrote {}", path.display());
            }
        }
        Ok(())
    }
}
