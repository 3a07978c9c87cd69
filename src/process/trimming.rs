// src/process/trimming.rs

use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use super::raw_table::{Cell, RawTable};
use super::record::NormalizedRow;
use super::utils::clean_str;
use crate::error::SchemaError;
use crate::schema::{canonicalize, Canonical, ColumnSource, Derived, OutputColumn};

/// Output of the normalize stage.
#[derive(Debug, Clone)]
pub struct Normalized {
    /// Input columns in input order, canonicalized; duplicates and names
    /// clashing with derived columns are already gone.
    pub columns: Vec<OutputColumn>,
    pub rows: Vec<NormalizedRow>,
}

/// Stage 1: canonicalize headers, trim text, lower-case identity values.
///
/// Errors if a critical column is absent after canonicalization.
pub fn normalize(raw: &RawTable) -> Result<Normalized, SchemaError> {
    // 1) Map each raw header index to a column source
    let mut seen: HashSet<String> = HashSet::new();
    let mut known: BTreeMap<Canonical, usize> = BTreeMap::new();
    let mut extras: Vec<usize> = Vec::new();
    let mut columns: Vec<OutputColumn> = Vec::with_capacity(raw.headers.len());

    for (idx, header) in raw.headers.iter().enumerate() {
        let name = canonicalize(header);
        if !seen.insert(name.clone()) {
            warn!(header = %header, column = %name, "duplicate column after canonicalization, keeping first");
            continue;
        }
        if Derived::from_name(&name).is_some() {
            warn!(column = %name, "input column shadows a derived column, ignoring it");
            continue;
        }
        match Canonical::from_name(&name) {
            Some(c) => {
                known.insert(c, idx);
                columns.push(OutputColumn::known(c));
            }
            None => {
                columns.push(OutputColumn {
                    name,
                    source: ColumnSource::Extra(extras.len()),
                });
                extras.push(idx);
            }
        }
    }

    // 2) Fail fast if the table can't be used at all
    for c in Canonical::CRITICAL {
        if !known.contains_key(&c) {
            return Err(SchemaError::MissingColumn {
                column: c.name().to_string(),
                available: columns.iter().map(|col| col.name.clone()).collect(),
            });
        }
    }
    debug!(
        known = known.len(),
        extra = extras.len(),
        "canonicalized header"
    );

    // 3) Normalize each row's values
    let rows = raw
        .rows
        .iter()
        .map(|row| {
            let identity = |c: Canonical| -> Option<String> {
                let cell = known.get(&c).and_then(|&i| row.get(i))?;
                let text = cell.as_text()?;
                clean_str(&text).map(str::to_lowercase)
            };

            let cells = known
                .iter()
                .filter(|(c, _)| c.is_numeric())
                .map(|(&c, &i)| (c, trim_cell(row.get(i))))
                .collect();

            let extra = extras
                .iter()
                .map(|&i| {
                    row.get(i)
                        .and_then(Cell::as_text)
                        .and_then(|t| clean_str(&t).map(str::to_string))
                })
                .collect();

            NormalizedRow {
                year: identity(Canonical::Year),
                breakdown: identity(Canonical::Breakdown),
                level_description: identity(Canonical::LevelDescription),
                cells,
                extra,
            }
        })
        .collect();

    Ok(Normalized { columns, rows })
}

/// Trim a text cell; blank text becomes `Missing`. Numbers pass through.
fn trim_cell(cell: Option<&Cell>) -> Cell {
    match cell {
        Some(Cell::Text(s)) => match clean_str(s) {
            Some(t) => Cell::Text(t.to_string()),
            None => Cell::Missing,
        },
        Some(Cell::Number(n)) => Cell::Number(*n),
        Some(Cell::Missing) | None => Cell::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn raw(headers: &[&str], rows: Vec<Vec<Cell>>) -> RawTable {
        let mut t = RawTable::new(headers.iter().map(|h| h.to_string()).collect());
        for r in rows {
            t.push_row(r);
        }
        t
    }

    #[test]
    fn identity_values_are_trimmed_and_lowercased() {
        let t = raw(
            &[" Year", "Breakdown ", "Level Description", "Indicator value", "Source"],
            vec![vec![
                text(" 2020/21 "),
                text("  England"),
                text("All Persons "),
                text(" 120 "),
                text("  NHS Digital "),
            ]],
        );
        let n = normalize(&t).unwrap();
        let row = &n.rows[0];
        assert_eq!(row.year.as_deref(), Some("2020/21"));
        assert_eq!(row.breakdown.as_deref(), Some("england"));
        assert_eq!(row.level_description.as_deref(), Some("all persons"));
        assert_eq!(row.cells[&Canonical::IndicatorValue], text("120"));
        // pass-through keeps its case
        assert_eq!(row.extra, vec![Some("NHS Digital".to_string())]);
        assert_eq!(n.columns[4].name, "source");
        assert_eq!(n.columns[4].source, ColumnSource::Extra(0));
    }

    #[test]
    fn missing_critical_column_is_a_schema_error() {
        let t = raw(&["Year", "Breakdown", "Indicator value"], vec![]);
        let err = normalize(&t).unwrap_err();
        match err {
            SchemaError::MissingColumn { column, available } => {
                assert_eq!(column, "level_description");
                assert_eq!(available, vec!["year", "breakdown", "indicator_value"]);
            }
        }
    }

    #[test]
    fn blank_text_becomes_missing_and_numbers_render_as_text() {
        let t = raw(
            &["year", "breakdown", "level_description", "indicator_value"],
            vec![vec![Cell::Number(2019.0), text("   "), Cell::Missing, text("  ")]],
        );
        let row = &normalize(&t).unwrap().rows[0];
        assert_eq!(row.year.as_deref(), Some("2019"));
        assert_eq!(row.breakdown, None);
        assert_eq!(row.level_description, None);
        assert_eq!(row.cells[&Canonical::IndicatorValue], Cell::Missing);
    }

    #[test]
    fn duplicate_and_derived_headers_are_dropped() {
        let t = raw(
            &["Year", "year ", "Breakdown", "Level description", "Indicator value", "CI width"],
            vec![vec![
                text("2019/20"),
                text("ignored"),
                text("age"),
                text("65-74"),
                text("1"),
                text("9"),
            ]],
        );
        let n = normalize(&t).unwrap();
        let names: Vec<_> = n.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["year", "breakdown", "level_description", "indicator_value"]);
        assert_eq!(n.rows[0].year.as_deref(), Some("2019/20"));
        assert!(n.rows[0].extra.is_empty());
    }
}
