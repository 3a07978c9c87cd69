// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema};
use std::sync::Arc;

use super::columns::{ColumnSource, Derived, OutputColumn};

/// Map an output column onto its Arrow type.
///
/// - numeric canonical columns, `ci_width` → Float64
/// - `year_start`                         → Int32
/// - `high_uncertainty`                   → Boolean
/// - identity columns, pass-through, `financial_year` → Utf8
pub fn map_to_arrow_type(source: ColumnSource) -> DataType {
    match source {
        ColumnSource::Known(c) if c.is_numeric() => DataType::Float64,
        ColumnSource::Known(_) | ColumnSource::Extra(_) => DataType::Utf8,
        ColumnSource::Derived(Derived::YearStart) => DataType::Int32,
        ColumnSource::Derived(Derived::FinancialYear) => DataType::Utf8,
        ColumnSource::Derived(Derived::CiWidth) => DataType::Float64,
        ColumnSource::Derived(Derived::HighUncertainty) => DataType::Boolean,
    }
}

/// Columns that can never be null in a cleaned table.
fn is_required(source: ColumnSource) -> bool {
    match source {
        ColumnSource::Known(c) => c.is_critical(),
        ColumnSource::Extra(_) => false,
        ColumnSource::Derived(d) => d != Derived::CiWidth,
    }
}

/// Build an ArrowSchema (inside an Arc) from the cleaned table's columns.
pub fn build_arrow_schema(cols: &[OutputColumn]) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = cols
        .iter()
        .map(|col| {
            ArrowField::new(
                &col.name,
                map_to_arrow_type(col.source),
                !is_required(col.source),
            )
        })
        .collect();

    Arc::new(ArrowSchema::new(fields))
}
