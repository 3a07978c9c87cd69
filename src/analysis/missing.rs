// src/analysis/missing.rs

use arrow::{array::Array, record_batch::RecordBatch};
use serde::Serialize;
use std::cmp::Ordering;

use crate::process::RawTable;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMissing {
    pub column: String,
    pub missing: usize,
    pub percent: f64,
}

/// Missing-cell share per column, highest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MissingReport {
    pub rows: usize,
    pub columns: Vec<ColumnMissing>,
}

impl MissingReport {
    /// Only empty cells count; a suppression marker is still a value here.
    pub fn from_raw(raw: &RawTable) -> Self {
        let counts = raw.headers.iter().enumerate().map(|(i, name)| {
            let missing = raw
                .rows
                .iter()
                .filter(|row| row.get(i).map_or(true, |c| c.is_missing()))
                .count();
            (name.clone(), missing)
        });
        Self::build(raw.len(), counts)
    }

    pub fn from_batch(batch: &RecordBatch) -> Self {
        let schema = batch.schema();
        let counts = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, array)| (field.name().clone(), array.null_count()));
        Self::build(batch.num_rows(), counts)
    }

    fn build(rows: usize, counts: impl Iterator<Item = (String, usize)>) -> Self {
        let mut columns: Vec<ColumnMissing> = counts
            .map(|(column, missing)| ColumnMissing {
                column,
                missing,
                percent: if rows == 0 {
                    0.0
                } else {
                    missing as f64 * 100.0 / rows as f64
                },
            })
            .collect();
        columns.sort_by(|a, b| {
            b.percent
                .partial_cmp(&a.percent)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.column.cmp(&b.column))
        });
        Self { rows, columns }
    }

    pub fn top(mut self, n: usize) -> Self {
        self.columns.truncate(n);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CleaningConfig;
    use crate::process::{clean, Cell};

    fn raw() -> RawTable {
        let mut t = RawTable::new(
            ["Year", "Breakdown", "Level description", "Indicator value", "Observed"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        t.push_row(vec![
            Cell::Text("2019/20".into()),
            Cell::Text("England".into()),
            Cell::Text("All".into()),
            Cell::Text("*".into()),
            Cell::Missing,
        ]);
        t.push_row(vec![
            Cell::Text("2019/20".into()),
            Cell::Text("Age".into()),
            Cell::Missing,
            Cell::Number(300.0),
            Cell::Missing,
        ]);
        t.push_row(vec![
            Cell::Text("2020/21".into()),
            Cell::Text("England".into()),
            Cell::Text("All".into()),
            Cell::Number(110.0),
            Cell::Number(1000.0),
        ]);
        t.push_row(vec![
            Cell::Text("2020/21".into()),
            Cell::Text("Age".into()),
            Cell::Text("65-74".into()),
            Cell::Number(310.0),
            Cell::Missing,
        ]);
        t
    }

    #[test]
    fn raw_counts_empty_cells_only() {
        let r = MissingReport::from_raw(&raw());
        assert_eq!(r.rows, 4);
        let names: Vec<&str> = r.columns.iter().map(|c| c.column.as_str()).collect();
        // ties at 0% fall back to name order
        assert_eq!(
            names,
            vec!["Observed", "Level description", "Breakdown", "Indicator value", "Year"]
        );
        assert_eq!(r.columns[0].percent, 75.0);
        assert_eq!(r.columns[1].percent, 25.0);
        // the marker is not missing before cleaning
        assert_eq!(r.columns[3].missing, 0);
    }

    #[test]
    fn top_keeps_the_worst_columns() {
        let r = MissingReport::from_raw(&raw()).top(2);
        assert_eq!(r.columns.len(), 2);
        assert_eq!(r.columns[0].column, "Observed");
    }

    #[test]
    fn cleaned_batch_has_no_missing_critical_values() -> anyhow::Result<()> {
        let out = clean(&raw(), &CleaningConfig::default())?;
        let r = MissingReport::from_batch(&out.table.to_record_batch()?);
        assert_eq!(r.rows, 2);
        let missing = |name: &str| {
            r.columns
                .iter()
                .find(|c| c.column == name)
                .map(|c| c.missing)
        };
        for name in ["year", "breakdown", "level_description", "indicator_value"] {
            assert_eq!(missing(name), Some(0), "{name}");
        }
        // the age group has no observed value to take a median from
        assert_eq!(missing("observed"), Some(1));
        // no CI columns in the input, so no width anywhere
        assert_eq!(r.columns[0].column, "ci_width");
        assert_eq!(r.columns[0].percent, 100.0);
        assert_eq!(r.columns[1].column, "observed");
        Ok(())
    }

    #[test]
    fn empty_table_reports_zero_percent() {
        let t = RawTable::new(vec!["a".into()]);
        let r = MissingReport::from_raw(&t);
        assert_eq!(r.columns[0].percent, 0.0);
    }
}
