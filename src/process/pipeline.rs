// src/process/pipeline.rs

use tracing::{debug, info, instrument};

use super::{
    convert::coerce_numeric,
    derive::{derive_records, uncertainty_threshold},
    impute::apply_missing_policy,
    raw_table::RawTable,
    record::CleanRecord,
    split::split_by_breakdown,
    stats::CleanStats,
    table::{CleanTable, Partition},
    trimming::normalize,
    validate::{filter_critical, recheck_indicator, validate_ci},
};
use crate::config::CleaningConfig;
use crate::error::SchemaError;
use crate::schema::{ColumnSource, Derived, OutputColumn};

/// Everything one run of [`clean`] produces.
#[derive(Debug, Clone)]
pub struct CleanOutput {
    pub table: CleanTable,
    pub partitions: Vec<Partition>,
    pub stats: CleanStats,
}

/// Turn a raw sheet into the cleaned table and its per-breakdown partitions.
///
/// Only fails when a critical column is absent from the header. Every
/// row-level problem is resolved by dropping or filling, and counted in
/// [`CleanStats`].
#[instrument(level = "info", skip_all, fields(rows = raw.len(), cols = raw.headers.len()))]
pub fn clean(raw: &RawTable, config: &CleaningConfig) -> Result<CleanOutput, SchemaError> {
    let mut stats = CleanStats {
        rows_in: raw.len(),
        ..CleanStats::default()
    };

    // 1) Normalize names and values
    let normalized = normalize(raw)?;
    let present: Vec<_> = normalized
        .columns
        .iter()
        .filter_map(|c| match c.source {
            ColumnSource::Known(k) => Some(k),
            _ => None,
        })
        .collect();

    // 2-3) year_start + first critical pass on raw cells
    let candidates = filter_critical(normalized.rows, &mut stats);

    // 4) Coerce numbers, then re-check the indicator now that `*` is null
    let coerced = coerce_numeric(candidates, &config.suppression_marker, &mut stats);
    let measured = recheck_indicator(coerced, &mut stats);

    // 5) CI ordering
    let mut measured = validate_ci(measured, &mut stats);

    // 6) Missing-value policy
    apply_missing_policy(
        &mut measured,
        &present,
        &config.median_fill,
        &config.zero_fill,
        &mut stats,
    );

    // 7) Prune, then append derived columns
    let mut columns: Vec<OutputColumn> = normalized
        .columns
        .into_iter()
        .filter(|c| {
            let keep = !config.drops(&c.name);
            if !keep {
                debug!(column = %c.name, "pruned");
            }
            keep
        })
        .collect();
    columns.extend(Derived::ALL.into_iter().map(OutputColumn::derived));

    // 8) Derive, with the threshold fixed over the whole filtered table
    let threshold = uncertainty_threshold(&measured, config.uncertainty_quantile);
    stats.high_uncertainty_threshold = threshold;
    let mut records = derive_records(measured, threshold);

    // 9) Sort
    sort_records(&mut records);
    stats.rows_out = records.len();

    let table = CleanTable { columns, records };

    // 10) Partition
    let partitions = split_by_breakdown(&table);

    info!(
        rows_in = stats.rows_in,
        rows_out = stats.rows_out,
        dropped = stats.rows_dropped(),
        partitions = partitions.len(),
        "cleaned"
    );

    Ok(CleanOutput {
        table,
        partitions,
        stats,
    })
}

/// Stable sort by `(year_start, breakdown, level_description)`.
pub fn sort_records(records: &mut [CleanRecord]) {
    records.sort_by(|a, b| {
        a.year_start
            .cmp(&b.year_start)
            .then_with(|| a.breakdown.cmp(&b.breakdown))
            .then_with(|| a.level_description.cmp(&b.level_description))
    });
}
