// src/report.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::analysis::{MissingReport, TrendSummary};
use crate::process::{CleanStats, Partition};

#[derive(Debug, Clone, Serialize)]
pub struct PartitionSummary {
    pub breakdown: String,
    pub name: String,
    pub rows: usize,
}

impl From<&Partition> for PartitionSummary {
    fn from(p: &Partition) -> Self {
        Self {
            breakdown: p.breakdown.clone(),
            name: p.name.clone(),
            rows: p.table.len(),
        }
    }
}

/// What a run did, written next to the cleaned files.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub input: PathBuf,
    pub stats: CleanStats,
    pub missing_before: MissingReport,
    pub missing_after: MissingReport,
    pub partitions: Vec<PartitionSummary>,
    pub trend: Option<TrendSummary>,
}

impl RunReport {
    pub fn new(
        input: PathBuf,
        stats: CleanStats,
        missing_before: MissingReport,
        missing_after: MissingReport,
        partitions: &[Partition],
        trend: Option<TrendSummary>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            input,
            stats,
            missing_before,
            missing_after,
            partitions: partitions.iter().map(PartitionSummary::from).collect(),
            trend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CleaningConfig;
    use crate::process::{clean, Cell, RawTable};

    #[test]
    fn report_serializes_stats_and_partitions() -> anyhow::Result<()> {
        let mut raw = RawTable::new(
            ["Year", "Breakdown", "Level description", "Indicator value"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        raw.push_row(vec![
            Cell::Text("2019/20".into()),
            Cell::Text("England".into()),
            Cell::Text("All".into()),
            Cell::Number(120.0),
        ]);
        raw.push_row(vec![
            Cell::Text("2019/20".into()),
            Cell::Text("England".into()),
            Cell::Text("All".into()),
            Cell::Text("*".into()),
        ]);
        let out = clean(&raw, &CleaningConfig::default())?;
        let report = RunReport::new(
            PathBuf::from("in.csv"),
            out.stats.clone(),
            MissingReport::from_raw(&raw),
            MissingReport::from_batch(&out.table.to_record_batch()?),
            &out.partitions,
            None,
        );

        let json = serde_json::to_value(&report)?;
        assert_eq!(json["input"], "in.csv");
        assert_eq!(json["stats"]["rows_in"], 2);
        assert_eq!(json["stats"]["dropped_suppressed_indicator"], 1);
        assert_eq!(json["partitions"][0]["name"], "england");
        assert_eq!(json["partitions"][0]["rows"], 1);
        assert!(json["trend"].is_null());
        assert!(json["generated_at"].is_string());
        Ok(())
    }
}
