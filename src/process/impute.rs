// src/process/impute.rs

use std::collections::HashMap;
use tracing::debug;

use super::record::Measured;
use super::stats::CleanStats;
use super::utils::median;
use crate::schema::Canonical;

/// Per-breakdown medians of `column`, computed in one pass over `rows`.
/// Groups with no values are absent.
pub fn group_medians(rows: &[Measured], column: Canonical) -> HashMap<String, f64> {
    let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();
    for row in rows {
        if let Some(v) = row.measures.get(column) {
            groups.entry(row.breakdown.as_str()).or_default().push(v);
        }
    }
    groups
        .into_iter()
        .filter_map(|(k, mut vs)| median(&mut vs).map(|m| (k.to_string(), m)))
        .collect()
}

/// Stage 6: fill `median_fill` columns with their breakdown-group median and
/// `zero_fill` columns with zero. Columns missing from the schema are skipped.
pub fn apply_missing_policy(
    rows: &mut [Measured],
    present: &[Canonical],
    median_fill: &[Canonical],
    zero_fill: &[Canonical],
    stats: &mut CleanStats,
) {
    for &column in median_fill.iter().filter(|c| present.contains(*c)) {
        let medians = group_medians(rows, column);
        let mut filled = 0;
        for row in rows.iter_mut() {
            let group_median = medians.get(&row.breakdown).copied();
            if let Some(slot) = row.measures.slot_mut(column) {
                if slot.is_none() && group_median.is_some() {
                    *slot = group_median;
                    filled += 1;
                }
            }
        }
        debug!(column = %column, groups = medians.len(), filled, "median fill");
        *stats.imputed.entry(column.name().to_string()).or_default() += filled;
    }

    for &column in zero_fill.iter().filter(|c| present.contains(*c)) {
        let mut filled = 0;
        for row in rows.iter_mut() {
            if let Some(slot) = row.measures.slot_mut(column) {
                if slot.is_none() {
                    *slot = Some(0.0);
                    filled += 1;
                }
            }
        }
        debug!(column = %column, filled, "zero fill");
        *stats.imputed.entry(column.name().to_string()).or_default() += filled;
    }
}
