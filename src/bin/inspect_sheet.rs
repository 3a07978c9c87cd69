use acsc_pipeline::{
    analysis::MissingReport,
    config::InputConfig,
    reader::read_table,
    schema::{canonicalize, Canonical},
};
use anyhow::Result;
use clap::Parser;
use prettytable::{format, Cell, Row, Table};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

/// Show how a sheet's header canonicalizes, how empty each column is, and
/// its first rows.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(short, long)]
    input: Option<PathBuf>,
    #[arg(long)]
    sheet: Option<String>,
    #[arg(long)]
    skip_rows: Option<usize>,
    /// Data rows to print.
    #[arg(short = 'n', long, default_value_t = 5)]
    rows: usize,
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let defaults = InputConfig::default();
    let path = args.input.unwrap_or(defaults.path);
    let sheet = args.sheet.unwrap_or(defaults.sheet);
    let skip_rows = args.skip_rows.unwrap_or(defaults.skip_rows);

    let raw = read_table(&path, &sheet, skip_rows)?;
    println!(
        "{}: {} rows x {} columns",
        path.display(),
        raw.len(),
        raw.headers.len()
    );

    // Header mapping
    let mut header = Table::new();
    header.set_format(*format::consts::FORMAT_BOX_CHARS);
    header.set_titles(Row::new(vec![
        Cell::new("#"),
        Cell::new("Header"),
        Cell::new("Canonical"),
        Cell::new("Role"),
    ]));
    for (i, name) in raw.headers.iter().enumerate() {
        let canonical = canonicalize(name);
        let role = match Canonical::from_name(&canonical) {
            Some(c) if c.is_critical() => "critical",
            Some(c) if c.is_numeric() => "numeric",
            Some(_) => "known",
            None => "extra",
        };
        header.add_row(Row::new(vec![
            Cell::new(&i.to_string()),
            Cell::new(name),
            Cell::new(&canonical),
            Cell::new(role),
        ]));
    }
    header.printstd();

    // Missing share
    let missing = MissingReport::from_raw(&raw);
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(Row::new(vec![
        Cell::new("Column"),
        Cell::new("Missing"),
        Cell::new("%"),
    ]));
    for c in &missing.columns {
        table.add_row(Row::new(vec![
            Cell::new(&c.column),
            Cell::new(&c.missing.to_string()).style_spec("r"),
            Cell::new(&format!("{:.1}", c.percent)).style_spec("r"),
        ]));
    }
    table.printstd();

    // First rows
    let mut sample = Table::new();
    sample.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    sample.set_titles(Row::new(raw.headers.iter().map(|h| Cell::new(h)).collect()));
    for row in raw.rows.iter().take(args.rows) {
        sample.add_row(Row::new(
            row.iter().map(|c| Cell::new(&c.to_string())).collect(),
        ));
    }
    sample.printstd();

    Ok(())
}
