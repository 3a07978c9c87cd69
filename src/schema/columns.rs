// src/schema/columns.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trim, lower-case and replace each space with `_`.
///
/// `"  Level Description "` → `"level_description"`.
pub fn canonicalize(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// The semantic columns the pipeline knows about. Anything else is carried
/// through as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Canonical {
    Year,
    Breakdown,
    LevelDescription,
    IndicatorValue,
    LowerCi,
    UpperCi,
    StandardisedRatio,
    Observed,
    Expected,
    Population,
    PercentUnclassified,
}

impl Canonical {
    pub const ALL: [Canonical; 11] = [
        Canonical::Year,
        Canonical::Breakdown,
        Canonical::LevelDescription,
        Canonical::IndicatorValue,
        Canonical::LowerCi,
        Canonical::UpperCi,
        Canonical::StandardisedRatio,
        Canonical::Observed,
        Canonical::Expected,
        Canonical::Population,
        Canonical::PercentUnclassified,
    ];

    /// A row missing any of these is unusable.
    pub const CRITICAL: [Canonical; 4] = [
        Canonical::Year,
        Canonical::Breakdown,
        Canonical::LevelDescription,
        Canonical::IndicatorValue,
    ];

    pub const NUMERIC: [Canonical; 8] = [
        Canonical::IndicatorValue,
        Canonical::LowerCi,
        Canonical::UpperCi,
        Canonical::StandardisedRatio,
        Canonical::Observed,
        Canonical::Expected,
        Canonical::Population,
        Canonical::PercentUnclassified,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Canonical::Year => "year",
            Canonical::Breakdown => "breakdown",
            Canonical::LevelDescription => "level_description",
            Canonical::IndicatorValue => "indicator_value",
            Canonical::LowerCi => "lower_ci",
            Canonical::UpperCi => "upper_ci",
            Canonical::StandardisedRatio => "standardised_ratio",
            Canonical::Observed => "observed",
            Canonical::Expected => "expected",
            Canonical::Population => "population",
            Canonical::PercentUnclassified => "percent_unclassified",
        }
    }

    /// Look up an already-canonicalized name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn is_numeric(self) -> bool {
        Self::NUMERIC.contains(&self)
    }

    pub fn is_critical(self) -> bool {
        Self::CRITICAL.contains(&self)
    }
}

impl fmt::Display for Canonical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Columns computed by the pipeline, appended after the input columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Derived {
    YearStart,
    FinancialYear,
    CiWidth,
    HighUncertainty,
}

impl Derived {
    pub const ALL: [Derived; 4] = [
        Derived::YearStart,
        Derived::FinancialYear,
        Derived::CiWidth,
        Derived::HighUncertainty,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Derived::YearStart => "year_start",
            Derived::FinancialYear => "financial_year",
            Derived::CiWidth => "ci_width",
            Derived::HighUncertainty => "high_uncertainty",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }
}

/// Where an output column's values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    Known(Canonical),
    /// Index into the record's pass-through values.
    Extra(usize),
    Derived(Derived),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    pub name: String,
    pub source: ColumnSource,
}

impl OutputColumn {
    pub fn known(c: Canonical) -> Self {
        Self {
            name: c.name().to_string(),
            source: ColumnSource::Known(c),
        }
    }

    pub fn derived(d: Derived) -> Self {
        Self {
            name: d.name().to_string(),
            source: ColumnSource::Derived(d),
        }
    }
}
