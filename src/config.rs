// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::schema::{canonicalize, Canonical};

/// Everything a run needs. Every field has a default, so a config file only
/// has to name what it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub cleaning: CleaningConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// `.xlsx`/`.xls`/`.ods` or `.csv`.
    pub path: PathBuf,
    pub sheet: String,
    /// Metadata rows above the header row.
    pub skip_rows: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/raw/NHSOF_2.3.i_I00708_D.xlsx"),
            sheet: "Indicator data".to_string(),
            skip_rows: 14,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// The table as read, always CSV.
    pub raw_file: String,
    /// Stem of the cleaned table; the extension follows `format`.
    pub cleaned_file: String,
    pub format: OutputFormat,
    pub report_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/processed"),
            raw_file: "before_cleaning.csv".to_string(),
            cleaned_file: "after_cleaning".to_string(),
            format: OutputFormat::Csv,
            report_file: "report.json".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn raw_path(&self) -> PathBuf {
        self.dir.join(&self.raw_file)
    }

    pub fn cleaned_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.cleaned_file, self.format.extension()))
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join(&self.report_file)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub suppression_marker: String,
    /// Filled with the median of their breakdown group.
    pub median_fill: Vec<Canonical>,
    /// Filled with zero.
    pub zero_fill: Vec<Canonical>,
    /// Canonical names of columns removed from the output.
    pub drop_columns: Vec<String>,
    /// CI widths above this quantile are flagged as high uncertainty.
    pub uncertainty_quantile: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            suppression_marker: "*".to_string(),
            median_fill: vec![Canonical::StandardisedRatio, Canonical::Observed],
            zero_fill: vec![Canonical::PercentUnclassified],
            drop_columns: [
                "period_of_coverage",
                "level",
                "quarter",
                "standardised_ratio_lower_ci",
                "standardised_ratio_upper_ci",
                "expected",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            uncertainty_quantile: 0.9,
        }
    }
}

impl CleaningConfig {
    pub fn validate(&self) -> Result<()> {
        if self.suppression_marker.trim().is_empty() {
            bail!("cleaning.suppression_marker must not be blank");
        }
        if !(0.0..=1.0).contains(&self.uncertainty_quantile) {
            bail!(
                "cleaning.uncertainty_quantile must be within [0, 1], got {}",
                self.uncertainty_quantile
            );
        }
        for c in self.median_fill.iter().chain(&self.zero_fill) {
            // CI bounds are checked before imputation runs
            let ci_bound = matches!(c, Canonical::LowerCi | Canonical::UpperCi);
            if !c.is_numeric() || c.is_critical() || ci_bound {
                bail!("column `{c}` can't be imputed");
            }
        }
        for name in &self.drop_columns {
            if let Some(c) = Canonical::from_name(&canonicalize(name)) {
                if c.is_critical() {
                    bail!("critical column `{c}` can't be dropped");
                }
            }
        }
        Ok(())
    }

    /// Whether `name` (canonical) is pruned from the output.
    pub fn drops(&self, name: &str) -> bool {
        self.drop_columns.iter().any(|d| canonicalize(d) == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Partition whose national series gets a trend summary.
    pub trend_partition: String,
    pub forecast_horizon: usize,
    /// How many columns the missing-data report keeps.
    pub top_missing: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trend_partition: "england".to_string(),
            forecast_horizon: 3,
            top_missing: 10,
        }
    }
}

impl PipelineConfig {
    /// Load from YAML; a missing path means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let cfg = match path {
            Some(p) => {
                let text = fs::read_to_string(p)
                    .with_context(|| format!("reading config {}", p.display()))?;
                Self::from_yaml(&text).with_context(|| format!("parsing config {}", p.display()))?
            }
            None => Self::default(),
        };
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(text)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.output.raw_file.trim().is_empty() || self.output.cleaned_file.trim().is_empty() {
            bail!("output file names must not be blank");
        }
        self.cleaning.validate()
    }
}
