// src/output.rs

use anyhow::{bail, Context, Result};
use arrow::csv::WriterBuilder;
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use rayon::prelude::*;
use serde::Serialize;
use std::{
    collections::HashSet,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

use crate::config::OutputFormat;
use crate::process::{CleanTable, Partition, RawTable};

/// Write through a temporary sibling, then rename over `path`.
fn write_atomic<F>(path: &Path, body: F) -> Result<()>
where
    F: FnOnce(File) -> Result<()>,
{
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let tmp_path = path.with_extension("tmp");
    let file =
        File::create(&tmp_path).with_context(|| format!("creating {}", tmp_path.display()))?;
    body(file).with_context(|| format!("writing {}", path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {} -> {}", tmp_path.display(), path.display()))?;
    Ok(())
}

/// The table exactly as read, for the before/after missing-data comparison.
#[instrument(level = "info", skip(raw), fields(rows = raw.len()))]
pub fn write_raw_csv(raw: &RawTable, path: &Path) -> Result<()> {
    write_atomic(path, |file| {
        let mut w = csv::Writer::from_writer(BufWriter::new(file));
        w.write_record(&raw.headers)?;
        for row in &raw.rows {
            w.write_record(row.iter().map(|c| c.to_string()))?;
        }
        w.flush()?;
        Ok(())
    })?;
    info!(path = %path.display(), "wrote raw table");
    Ok(())
}

/// Write a cleaned table (or a partition's table) as CSV with a header row,
/// or as Parquet.
pub fn write_table(table: &CleanTable, path: &Path, format: OutputFormat) -> Result<()> {
    let batch = table.to_record_batch()?;
    write_atomic(path, |file| {
        match format {
            OutputFormat::Csv => {
                let mut writer = WriterBuilder::new()
                    .with_header(true)
                    .build(BufWriter::new(file));
                writer.write(&batch).context("writing CSV batch")?;
            }
            OutputFormat::Parquet => {
                let props = WriterProperties::builder()
                    .set_compression(Compression::SNAPPY)
                    .build();
                let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
                    .context("creating Arrow writer")?;
                writer.write(&batch).context("writing Parquet batch")?;
                writer.close().context("closing Parquet writer")?;
            }
        }
        Ok(())
    })?;
    debug!(path = %path.display(), rows = table.len(), "wrote table");
    Ok(())
}

/// One file per partition, `{name}.{ext}` under `dir`, written in parallel.
/// A partition whose file would land on another partition's file, or on one
/// of the `reserved` paths (the run's other outputs), is refused.
#[instrument(
    level = "info",
    skip(partitions, reserved),
    fields(n = partitions.len(), dir = %dir.display())
)]
pub fn write_partitions(
    partitions: &[Partition],
    dir: &Path,
    format: OutputFormat,
    reserved: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    let mut taken: HashSet<PathBuf> = reserved.iter().cloned().collect();
    let mut paths = Vec::with_capacity(partitions.len());
    for p in partitions {
        let path = dir.join(format!("{}.{}", p.name, format.extension()));
        if !taken.insert(path.clone()) {
            bail!(
                "breakdown `{}` maps to {}, which is already taken",
                p.breakdown,
                path.display()
            );
        }
        paths.push(path);
    }

    partitions
        .par_iter()
        .zip(paths.par_iter())
        .try_for_each(|(p, path)| write_table(&p.table, path, format))?;

    info!(files = paths.len(), "wrote partitions");
    Ok(paths)
}

/// Pretty JSON with a trailing newline.
pub fn write_report<T: Serialize>(report: &T, path: &Path) -> Result<()> {
    write_atomic(path, |file| {
        let mut w = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut w, report)?;
        w.write_all(b"\n")?;
        w.flush()?;
        Ok(())
    })?;
    info!(path = %path.display(), "wrote report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CleaningConfig;
    use crate::process::{clean, Cell};
    use crate::reader::read_csv;

    fn raw() -> RawTable {
        let mut t = RawTable::new(
            [
                "Year",
                "Breakdown",
                "Level description",
                "Indicator value",
                "Lower CI",
                "Upper CI",
                "Percent unclassified",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        );
        let rows: &[&[&str]] = &[
            &["2020/21", "England", "All", "120", "110", "130", ""],
            &["2020/21", "England", "All", "*", "100", "140", ""],
            &["2019/20", "2015 Deprivation decile", "1", "200.5", "190", "210", "1.5"],
            &["2019/20", "Age", "65-74", "310", "260", "390", ""],
        ];
        for r in rows {
            t.push_row(
                r.iter()
                    .map(|s| {
                        if s.is_empty() {
                            Cell::Missing
                        } else {
                            Cell::Text(s.to_string())
                        }
                    })
                    .collect(),
            );
        }
        t
    }

    fn run(dir: &Path, format: OutputFormat) -> Result<Vec<PathBuf>> {
        let raw = raw();
        let raw_path = dir.join("before_cleaning.csv");
        let cleaned_path = dir.join(format!("after_cleaning.{}", format.extension()));
        write_raw_csv(&raw, &raw_path)?;
        let out = clean(&raw, &CleaningConfig::default())?;
        write_table(&out.table, &cleaned_path, format)?;
        write_partitions(&out.partitions, dir, format, &[raw_path, cleaned_path])
    }

    #[test]
    fn partitions_are_named_after_breakdowns() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let paths = run(dir.path(), OutputFormat::Csv)?;
        let mut names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["2015_deprivation_decile.csv", "age.csv", "england.csv"]);
        Ok(())
    }

    #[test]
    fn cleaned_csv_has_header_and_no_index() -> Result<()> {
        let dir = tempfile::tempdir()?;
        run(dir.path(), OutputFormat::Csv)?;

        let mut rdr = csv::Reader::from_path(dir.path().join("after_cleaning.csv"))?;
        let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
        assert_eq!(
            headers,
            vec![
                "year",
                "breakdown",
                "level_description",
                "indicator_value",
                "lower_ci",
                "upper_ci",
                "percent_unclassified",
                "year_start",
                "financial_year",
                "ci_width",
                "high_uncertainty",
            ]
        );
        let rows: Vec<csv::StringRecord> = rdr.records().collect::<Result<_, _>>()?;
        assert_eq!(rows.len(), 3);
        // sorted: 2019 rows first, breakdowns in order
        assert_eq!(&rows[0][1], "2015 deprivation decile");
        assert_eq!(&rows[1][1], "age");
        assert_eq!(&rows[2][1], "england");
        assert_eq!(rows[2][3].parse::<f64>()?, 120.0);
        assert_eq!(rows[2][9].parse::<f64>()?, 20.0);
        assert_eq!(&rows[2][8], "2020/21");
        Ok(())
    }

    #[test]
    fn raw_table_is_written_unmodified() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("before_cleaning.csv");
        let raw = raw();
        write_raw_csv(&raw, &path)?;
        let back = read_csv(&path, 0)?;
        assert_eq!(back, raw);
        Ok(())
    }

    #[test]
    fn repeated_runs_are_byte_identical() -> Result<()> {
        let a = tempfile::tempdir()?;
        let b = tempfile::tempdir()?;
        let pa = run(a.path(), OutputFormat::Csv)?;
        let pb = run(b.path(), OutputFormat::Csv)?;
        assert_eq!(pa.len(), pb.len());

        let mut files: Vec<PathBuf> = pa
            .iter()
            .map(|p| PathBuf::from(p.file_name().unwrap()))
            .collect();
        files.push(PathBuf::from("after_cleaning.csv"));
        for f in files {
            let x = fs::read(a.path().join(&f))?;
            let y = fs::read(b.path().join(&f))?;
            assert_eq!(x, y, "{} differs", f.display());
        }
        Ok(())
    }

    #[test]
    fn parquet_output_round_trips_row_count() -> Result<()> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let dir = tempfile::tempdir()?;
        run(dir.path(), OutputFormat::Parquet)?;
        let file = File::open(dir.path().join("after_cleaning.parquet"))?;
        let reader = SerializedFileReader::new(file)?;
        assert_eq!(reader.metadata().file_metadata().num_rows(), 3);
        assert!(dir.path().join("england.parquet").exists());
        Ok(())
    }

    #[test]
    fn colliding_partition_names_are_refused() -> Result<()> {
        let out = clean(&raw(), &CleaningConfig::default())?;
        let mut parts = out.partitions.clone();
        let mut dup = parts[0].clone();
        dup.breakdown = "2015/deprivation decile".into();
        parts.push(dup);

        let dir = tempfile::tempdir()?;
        assert!(write_partitions(&parts, dir.path(), OutputFormat::Csv, &[]).is_err());
        Ok(())
    }

    #[test]
    fn partitions_never_overwrite_the_cleaned_table() -> Result<()> {
        let out = clean(&raw(), &CleaningConfig::default())?;
        let mut parts = out.partitions.clone();
        parts[0].breakdown = "after cleaning".into();
        parts[0].name = "after_cleaning".into();

        let dir = tempfile::tempdir()?;
        let cleaned = dir.path().join("after_cleaning.csv");
        write_table(&out.table, &cleaned, OutputFormat::Csv)?;
        let before = fs::read(&cleaned)?;

        let reserved = [dir.path().join("before_cleaning.csv"), cleaned.clone()];
        assert!(write_partitions(&parts, dir.path(), OutputFormat::Csv, &reserved).is_err());
        assert_eq!(fs::read(&cleaned)?, before);
        // nothing was written for the other partitions either
        assert!(!dir.path().join("age.csv").exists());
        Ok(())
    }
}
