use acsc_pipeline::{
    analysis::{summarize, MissingReport},
    clean,
    config::{OutputFormat, PipelineConfig},
    output::{write_partitions, write_raw_csv, write_report, write_table},
    reader::read_table,
    report::RunReport,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Clean the chronic ACSC admissions sheet and split it by breakdown"
)]
struct Args {
    /// YAML config; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Spreadsheet or CSV to read.
    #[arg(short, long)]
    input: Option<PathBuf>,
    #[arg(long)]
    sheet: Option<String>,
    /// Metadata rows above the header.
    #[arg(long)]
    skip_rows: Option<usize>,
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

impl Args {
    fn apply(self, cfg: &mut PipelineConfig) {
        if let Some(p) = self.input {
            cfg.input.path = p;
        }
        if let Some(s) = self.sheet {
            cfg.input.sheet = s;
        }
        if let Some(n) = self.skip_rows {
            cfg.input.skip_rows = n;
        }
        if let Some(d) = self.output_dir {
            cfg.output.dir = d;
        }
        if let Some(f) = self.format {
            cfg.output.format = f;
        }
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) config ───────────────────────────────────────────────────
    let args = Args::parse();
    let mut cfg = PipelineConfig::load(args.config.as_deref())?;
    args.apply(&mut cfg);
    cfg.validate().context("invalid configuration")?;
    info!(input = %cfg.input.path.display(), output = %cfg.output.dir.display(), "startup");

    // ─── 3) read + keep a copy of the raw table ──────────────────────
    let raw = read_table(&cfg.input.path, &cfg.input.sheet, cfg.input.skip_rows)?;
    write_raw_csv(&raw, &cfg.output.raw_path())?;
    let missing_before = MissingReport::from_raw(&raw).top(cfg.analysis.top_missing);

    // ─── 4) clean ────────────────────────────────────────────────────
    let out = clean(&raw, &cfg.cleaning)?;
    let stats = &out.stats;
    info!(
        rows_in = stats.rows_in,
        rows_out = stats.rows_out,
        missing_critical = stats.dropped_missing_critical,
        unparseable_year = stats.dropped_unparseable_year,
        suppressed = stats.dropped_suppressed_indicator,
        invalid_ci = stats.dropped_invalid_ci,
        "cleaned"
    );
    if stats.parse_warnings > 0 {
        warn!(count = stats.parse_warnings, "numeric cells could not be parsed");
    }

    // ─── 5) write cleaned table + partitions ─────────────────────────
    write_table(&out.table, &cfg.output.cleaned_path(), cfg.output.format)?;
    let reserved = [
        cfg.output.raw_path(),
        cfg.output.cleaned_path(),
        cfg.output.report_path(),
    ];
    write_partitions(&out.partitions, &cfg.output.dir, cfg.output.format, &reserved)?;

    // ─── 6) report ───────────────────────────────────────────────────
    let missing_after =
        MissingReport::from_batch(&out.table.to_record_batch()?).top(cfg.analysis.top_missing);
    let trend = out
        .partitions
        .iter()
        .find(|p| p.name == cfg.analysis.trend_partition)
        .map(|p| summarize(p, cfg.analysis.forecast_horizon));
    match &trend {
        Some(t) => match &t.trend {
            Some(line) => info!(
                partition = %t.partition,
                slope = line.slope,
                r_squared = line.r_squared,
                "trend"
            ),
            None => info!(partition = %t.partition, "too few years for a trend"),
        },
        None => warn!(partition = %cfg.analysis.trend_partition, "trend partition not found"),
    }

    let report = RunReport::new(
        cfg.input.path.clone(),
        out.stats.clone(),
        missing_before,
        missing_after,
        &out.partitions,
        trend,
    );
    write_report(&report, &cfg.output.report_path())?;

    info!(partitions = out.partitions.len(), "done");
    Ok(())
}
