// src/process/stats.rs

use serde::Serialize;
use std::collections::BTreeMap;

/// Row accounting for one `clean()` run. Nothing here is an error; these are
/// the problems resolved by exclusion or imputation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanStats {
    pub rows_in: usize,
    /// Raw year, breakdown, level description or indicator cell was empty.
    pub dropped_missing_critical: usize,
    /// `year` had no integer before the `/`.
    pub dropped_unparseable_year: usize,
    /// Indicator was suppressed or unparseable, caught by the second pass.
    pub dropped_suppressed_indicator: usize,
    /// Validation exclusions: CI bounds out of order around the indicator.
    pub dropped_invalid_ci: usize,
    /// Numeric cells holding the suppression marker.
    pub suppressed_cells: usize,
    /// Numeric cells that failed to parse and were nulled.
    pub parse_warnings: usize,
    /// Cells filled by the missing-value policy, per column.
    pub imputed: BTreeMap<String, usize>,
    pub rows_out: usize,
    pub high_uncertainty_threshold: Option<f64>,
}

impl CleanStats {
    pub fn rows_dropped(&self) -> usize {
        self.dropped_missing_critical
            + self.dropped_unparseable_year
            + self.dropped_suppressed_indicator
            + self.dropped_invalid_ci
    }
}
