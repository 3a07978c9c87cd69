// src/process/validate.rs

use tracing::{debug, trace};

use super::record::{Candidate, Coerced, Measured, NormalizedRow};
use super::stats::CleanStats;
use super::utils::parse_year_start;
use crate::schema::Canonical;

/// Stages 2 and 3: derive `year_start` and drop rows with a missing critical
/// cell or an unusable year.
///
/// Missing here means the raw cell was empty; a suppressed indicator is still
/// text at this point and is caught by [`recheck_indicator`].
pub fn filter_critical(rows: Vec<NormalizedRow>, stats: &mut CleanStats) -> Vec<Candidate> {
    let mut kept = Vec::with_capacity(rows.len());

    for row in rows {
        let indicator_present = row
            .cells
            .get(&Canonical::IndicatorValue)
            .is_some_and(|c| !c.is_missing());

        let (year, breakdown, level_description) =
            match (row.year, row.breakdown, row.level_description) {
                (Some(y), Some(b), Some(l)) if indicator_present => (y, b, l),
                _ => {
                    stats.dropped_missing_critical += 1;
                    continue;
                }
            };

        let Some(year_start) = parse_year_start(&year) else {
            trace!(year = %year, "unparseable year");
            stats.dropped_unparseable_year += 1;
            continue;
        };

        kept.push(Candidate {
            year,
            year_start,
            breakdown,
            level_description,
            cells: row.cells,
            extra: row.extra,
        });
    }

    debug!(kept = kept.len(), "critical-column filter");
    kept
}

/// Second critical pass, after coercion: suppression markers and unparseable
/// text have become null, so the indicator is checked again.
pub fn recheck_indicator(rows: Vec<Coerced>, stats: &mut CleanStats) -> Vec<Measured> {
    let before = rows.len();
    let kept: Vec<Measured> = rows
        .into_iter()
        .filter_map(|row| {
            let indicator_value = row.indicator_value?;
            Some(Measured {
                year: row.year,
                year_start: row.year_start,
                breakdown: row.breakdown,
                level_description: row.level_description,
                indicator_value,
                measures: row.measures,
                extra: row.extra,
            })
        })
        .collect();

    stats.dropped_suppressed_indicator += before - kept.len();
    debug!(kept = kept.len(), "indicator re-check");
    kept
}

/// Stage 5: drop rows whose CI bounds don't bracket the indicator.
pub fn validate_ci(rows: Vec<Measured>, stats: &mut CleanStats) -> Vec<Measured> {
    let before = rows.len();
    let kept: Vec<Measured> = rows.into_iter().filter(Measured::ci_is_ordered).collect();
    stats.dropped_invalid_ci += before - kept.len();
    debug!(kept = kept.len(), "CI validation");
    kept
}
