// src/process/derive.rs

use tracing::debug;

use super::record::{CleanRecord, Measured};
use super::utils::{financial_year, quantile};

fn ci_width(row: &Measured) -> Option<f64> {
    Some(row.measures.upper_ci? - row.measures.lower_ci?)
}

/// The `q` quantile of CI width across every row that has one. Computed once
/// over the whole filtered table, never per partition.
pub fn uncertainty_threshold(rows: &[Measured], q: f64) -> Option<f64> {
    let mut widths: Vec<f64> = rows.iter().filter_map(ci_width).collect();
    quantile(&mut widths, q)
}

/// Stage 8: attach `financial_year`, `ci_width` and `high_uncertainty`.
pub fn derive_records(rows: Vec<Measured>, threshold: Option<f64>) -> Vec<CleanRecord> {
    let records: Vec<CleanRecord> = rows
        .into_iter()
        .map(|row| {
            let width = ci_width(&row);
            let high_uncertainty = matches!((width, threshold), (Some(w), Some(t)) if w > t);
            CleanRecord {
                financial_year: financial_year(row.year_start),
                year: row.year,
                year_start: row.year_start,
                breakdown: row.breakdown,
                level_description: row.level_description,
                indicator_value: row.indicator_value,
                measures: row.measures,
                ci_width: width,
                high_uncertainty,
                extra: row.extra,
            }
        })
        .collect();

    debug!(
        rows = records.len(),
        flagged = records.iter().filter(|r| r.high_uncertainty).count(),
        ?threshold,
        "derived columns"
    );
    records
}
