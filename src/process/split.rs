// src/process/split.rs

use std::collections::BTreeMap;
use tracing::{debug, instrument};

use super::record::CleanRecord;
use super::table::{CleanTable, Partition};
use super::utils::partition_name;

/// Stage 10: group the cleaned table by breakdown.
///
/// Every record lands in exactly one partition and keeps its position
/// relative to the others, so each partition is still sorted. Partitions
/// come back ordered by breakdown value.
#[instrument(level = "debug", skip(table), fields(rows = table.len()))]
pub fn split_by_breakdown(table: &CleanTable) -> Vec<Partition> {
    let mut groups: BTreeMap<&str, Vec<CleanRecord>> = BTreeMap::new();
    for rec in &table.records {
        groups
            .entry(rec.breakdown.as_str())
            .or_default()
            .push(rec.clone());
    }

    groups
        .into_iter()
        .map(|(breakdown, records)| {
            let name = partition_name(breakdown);
            debug!(breakdown, name = %name, rows = records.len(), "partition");
            Partition {
                breakdown: breakdown.to_string(),
                name,
                table: table.with_records(records),
            }
        })
        .collect()
}
