// src/process/table.rs

use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, BooleanArray, Float64Array, Int32Array, StringArray},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use super::record::CleanRecord;
use crate::schema::{build_arrow_schema, ColumnSource, Derived, OutputColumn};

/// The analysis-ready table: output columns in order, plus sorted records.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTable {
    pub columns: Vec<OutputColumn>,
    pub records: Vec<CleanRecord>,
}

impl CleanTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Same columns, restricted to `records`.
    pub fn with_records(&self, records: Vec<CleanRecord>) -> Self {
        Self {
            columns: self.columns.clone(),
            records,
        }
    }

    /// Build one Arrow array per output column.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let schema = build_arrow_schema(&self.columns);
        let arrays: Vec<ArrayRef> = self
            .columns
            .iter()
            .map(|col| self.column_array(col.source))
            .collect();

        RecordBatch::try_new(schema, arrays).context("building cleaned record batch")
    }

    fn column_array(&self, source: ColumnSource) -> ArrayRef {
        let recs = &self.records;
        match source {
            ColumnSource::Known(c) if c.is_numeric() => {
                Arc::new(recs.iter().map(|r| r.measure(c)).collect::<Float64Array>())
            }
            ColumnSource::Known(c) => Arc::new(
                recs.iter()
                    .map(|r| r.identity(c))
                    .collect::<StringArray>(),
            ),
            ColumnSource::Extra(i) => Arc::new(
                recs.iter()
                    .map(|r| r.extra.get(i).and_then(|v| v.as_deref()))
                    .collect::<StringArray>(),
            ),
            ColumnSource::Derived(Derived::YearStart) => {
                Arc::new(recs.iter().map(|r| r.year_start).collect::<Int32Array>())
            }
            ColumnSource::Derived(Derived::FinancialYear) => Arc::new(
                recs.iter()
                    .map(|r| Some(r.financial_year.as_str()))
                    .collect::<StringArray>(),
            ),
            ColumnSource::Derived(Derived::CiWidth) => {
                Arc::new(recs.iter().map(|r| r.ci_width).collect::<Float64Array>())
            }
            ColumnSource::Derived(Derived::HighUncertainty) => Arc::new(
                recs.iter()
                    .map(|r| Some(r.high_uncertainty))
                    .collect::<BooleanArray>(),
            ),
        }
    }
}

/// The cleaned rows of one breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Breakdown value as it appears in the data.
    pub breakdown: String,
    /// File-safe name derived from the breakdown.
    pub name: String,
    pub table: CleanTable,
}
