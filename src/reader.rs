// src/reader.rs

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::{io::Read, path::Path};
use tracing::{debug, info, instrument, warn};

use crate::process::{Cell, RawTable};

/// Read `path` as a spreadsheet or, for a `.csv` extension, as CSV.
pub fn read_table(path: &Path, sheet: &str, skip_rows: usize) -> Result<RawTable> {
    let is_csv = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        read_csv(path, skip_rows)
    } else {
        read_sheet(path, sheet, skip_rows)
    }
}

/// Read one worksheet. `skip_rows` counts from the first row of the sheet;
/// the row after them is the header.
#[instrument(level = "info", skip(path), fields(path = %path.display()))]
pub fn read_sheet(path: &Path, sheet_name: &str, skip_rows: usize) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;

    let names = workbook.sheet_names();
    if !names.iter().any(|n| n == sheet_name) {
        bail!(
            "sheet `{}` not found in {} (sheets: {})",
            sheet_name,
            path.display(),
            names.join(", ")
        );
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .with_context(|| format!("reading sheet `{}`", sheet_name))?;

    // calamine trims leading empty rows off the range
    let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
    let skip = skip_rows.saturating_sub(first_row);
    debug!(first_row, skip, "sheet range");

    let rows = range
        .rows()
        .skip(skip)
        .map(|row| row.iter().map(data_to_cell).collect::<Vec<Cell>>());
    let table = assemble(rows)?;

    info!(rows = table.len(), cols = table.headers.len(), "read sheet");
    Ok(table)
}

/// Read a CSV file with the same header semantics as [`read_sheet`].
#[instrument(level = "info", skip(path), fields(path = %path.display()))]
pub fn read_csv(path: &Path, skip_rows: usize) -> Result<RawTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;
    let table = read_csv_from(file, skip_rows)?;
    info!(rows = table.len(), cols = table.headers.len(), "read CSV");
    Ok(table)
}

pub fn read_csv_from<R: Read>(reader: R, skip_rows: usize) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate().skip(skip_rows) {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Missing
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect::<Vec<Cell>>(),
        );
    }
    assemble(rows.into_iter())
}

/// First row becomes the header; fully empty rows after it are skipped.
/// Data cells past the end of the header get `unnamed_{i}` columns.
fn assemble(mut rows: impl Iterator<Item = Vec<Cell>>) -> Result<RawTable> {
    let Some(header) = rows.next() else {
        bail!("no header row after the skipped rows");
    };

    let mut blank = 0usize;
    let data: Vec<Vec<Cell>> = rows
        .filter(|row| {
            let empty = row.iter().all(Cell::is_missing);
            blank += usize::from(empty);
            !empty
        })
        .collect();
    if blank > 0 {
        debug!(blank, "skipped empty rows");
    }

    // widest row, ignoring trailing empty cells
    let width = data
        .iter()
        .filter_map(|row| row.iter().rposition(|c| !c.is_missing()))
        .map(|last| last + 1)
        .max()
        .unwrap_or(0)
        .max(header.len());
    if width > header.len() {
        warn!(
            header = header.len(),
            width, "data rows are wider than the header, adding unnamed columns"
        );
    }

    let headers: Vec<String> = (0..width)
        .map(|i| match header.get(i) {
            Some(Cell::Missing) | None => format!("unnamed_{}", i),
            Some(other) => other.to_string(),
        })
        .collect();

    let mut table = RawTable::new(headers);
    for row in data {
        table.push_row(row);
    }
    Ok(table)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Missing,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const SHEET: &str = "\
Indicator 2.3.i,,,
Published by NHS Digital,,,
,,,
Year,Breakdown,Level description,Indicator value
2019/20,England,All,120.5
,,,
2019/20,Age,65-74,*
2020/21,Gender
";

    #[test]
    fn skips_metadata_rows_and_reads_header() -> Result<()> {
        let t = read_csv_from(Cursor::new(SHEET), 3)?;
        assert_eq!(
            t.headers,
            vec!["Year", "Breakdown", "Level description", "Indicator value"]
        );
        assert_eq!(t.len(), 3);
        assert_eq!(t.rows[0][3], Cell::Text("120.5".into()));
        assert_eq!(t.rows[1][3], Cell::Text("*".into()));
        // short row padded
        assert_eq!(t.rows[2][2], Cell::Missing);
        Ok(())
    }

    #[test]
    fn blank_header_cells_get_placeholder_names() -> Result<()> {
        let t = read_csv_from(Cursor::new("a,,c\n1,2,3\n"), 0)?;
        assert_eq!(t.headers, vec!["a", "unnamed_1", "c"]);
        Ok(())
    }

    #[test]
    fn cells_past_the_header_are_kept_under_new_columns() -> Result<()> {
        let t = read_csv_from(Cursor::new("a,b\n1,2,3,\n4,5\n"), 0)?;
        assert_eq!(t.headers, vec!["a", "b", "unnamed_2"]);
        assert_eq!(t.rows[0][2], Cell::Text("3".into()));
        assert_eq!(t.rows[1][2], Cell::Missing);
        Ok(())
    }

    #[test]
    fn nothing_after_skip_is_an_error() {
        assert!(read_csv_from(Cursor::new("x\ny\n"), 5).is_err());
    }

    #[test]
    fn csv_extension_dispatches_to_csv_reader() -> Result<()> {
        let mut tmp = tempfile::Builder::new().suffix(".csv").tempfile()?;
        tmp.write_all(SHEET.as_bytes())?;
        let t = read_table(tmp.path(), "ignored", 3)?;
        assert_eq!(t.headers.len(), 4);
        assert_eq!(t.len(), 3);
        Ok(())
    }

    #[test]
    fn calamine_cells_map_onto_raw_cells() {
        assert_eq!(data_to_cell(&Data::Empty), Cell::Missing);
        assert_eq!(data_to_cell(&Data::Int(2019)), Cell::Number(2019.0));
        assert_eq!(data_to_cell(&Data::Float(1.5)), Cell::Number(1.5));
        assert_eq!(data_to_cell(&Data::String("*".into())), Cell::Text("*".into()));
        assert_eq!(data_to_cell(&Data::Bool(true)), Cell::Text("true".into()));
    }
}
