// src/process/convert.rs

use tracing::{debug, trace};

use super::raw_table::Cell;
use super::record::{Candidate, Coerced, Measures};
use super::stats::CleanStats;
use crate::schema::Canonical;

/// Outcome of coercing one numeric cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coercion {
    Value(f64),
    Missing,
    Suppressed,
    /// Text that isn't a number: a parse warning, resolved to null.
    Unparseable,
}

impl Coercion {
    pub fn value(self) -> Option<f64> {
        match self {
            Coercion::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Coerce a single cell. Non-finite numbers count as missing.
pub fn coerce_cell(cell: &Cell, suppression_marker: &str) -> Coercion {
    match cell {
        Cell::Missing => Coercion::Missing,
        Cell::Number(n) if n.is_finite() => Coercion::Value(*n),
        Cell::Number(_) => Coercion::Missing,
        Cell::Text(s) => {
            let s = s.trim();
            if s == suppression_marker {
                Coercion::Suppressed
            } else {
                match s.parse::<f64>() {
                    Ok(v) if v.is_finite() => Coercion::Value(v),
                    _ => Coercion::Unparseable,
                }
            }
        }
    }
}

/// Stage 4: turn every numeric cell into `Option<f64>`. Never fails; the
/// counts land in `stats`.
pub fn coerce_numeric(
    rows: Vec<Candidate>,
    suppression_marker: &str,
    stats: &mut CleanStats,
) -> Vec<Coerced> {
    let out: Vec<Coerced> = rows
        .into_iter()
        .map(|row| {
            let mut indicator_value = None;
            let mut measures = Measures::default();

            for (column, cell) in &row.cells {
                let coerced = coerce_cell(cell, suppression_marker);
                match coerced {
                    Coercion::Suppressed => stats.suppressed_cells += 1,
                    Coercion::Unparseable => {
                        trace!(column = %column, cell = %cell, "numeric parse failed");
                        stats.parse_warnings += 1;
                    }
                    _ => {}
                }

                if *column == Canonical::IndicatorValue {
                    indicator_value = coerced.value();
                } else if let Some(slot) = measures.slot_mut(*column) {
                    *slot = coerced.value();
                }
            }

            Coerced {
                year: row.year,
                year_start: row.year_start,
                breakdown: row.breakdown,
                level_description: row.level_description,
                indicator_value,
                measures,
                extra: row.extra,
            }
        })
        .collect();

    debug!(
        rows = out.len(),
        suppressed = stats.suppressed_cells,
        parse_warnings = stats.parse_warnings,
        "numeric coercion"
    );
    out
}
