// src/process/record.rs
//
// Row types for each phase of `clean()`. Each phase consumes the previous
// one, so a later type can only exist once its invariants hold.

use std::collections::BTreeMap;

use super::raw_table::Cell;
use crate::schema::Canonical;

/// Optional numeric measures. `indicator_value` is required and lives on the
/// row itself once it has been checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measures {
    pub lower_ci: Option<f64>,
    pub upper_ci: Option<f64>,
    pub standardised_ratio: Option<f64>,
    pub observed: Option<f64>,
    pub expected: Option<f64>,
    pub population: Option<f64>,
    pub percent_unclassified: Option<f64>,
}

impl Measures {
    pub fn get(&self, column: Canonical) -> Option<f64> {
        match column {
            Canonical::LowerCi => self.lower_ci,
            Canonical::UpperCi => self.upper_ci,
            Canonical::StandardisedRatio => self.standardised_ratio,
            Canonical::Observed => self.observed,
            Canonical::Expected => self.expected,
            Canonical::Population => self.population,
            Canonical::PercentUnclassified => self.percent_unclassified,
            _ => None,
        }
    }

    /// Mutable slot for an optional measure; `None` for the required and
    /// text columns.
    pub fn slot_mut(&mut self, column: Canonical) -> Option<&mut Option<f64>> {
        match column {
            Canonical::LowerCi => Some(&mut self.lower_ci),
            Canonical::UpperCi => Some(&mut self.upper_ci),
            Canonical::StandardisedRatio => Some(&mut self.standardised_ratio),
            Canonical::Observed => Some(&mut self.observed),
            Canonical::Expected => Some(&mut self.expected),
            Canonical::Population => Some(&mut self.population),
            Canonical::PercentUnclassified => Some(&mut self.percent_unclassified),
            _ => None,
        }
    }
}

/// A normalized row: identity values trimmed and lower-cased, numeric cells
/// still raw.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub year: Option<String>,
    pub breakdown: Option<String>,
    pub level_description: Option<String>,
    /// Raw cells of every numeric column present in the header.
    pub cells: BTreeMap<Canonical, Cell>,
    /// Pass-through values, aligned with the table's extra columns.
    pub extra: Vec<Option<String>>,
}

/// Survived the first critical-column pass; numbers not yet coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub year: String,
    pub year_start: i32,
    pub breakdown: String,
    pub level_description: String,
    pub cells: BTreeMap<Canonical, Cell>,
    pub extra: Vec<Option<String>>,
}

/// Coerced, but the indicator may have turned out to be suppressed.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub year: String,
    pub year_start: i32,
    pub breakdown: String,
    pub level_description: String,
    pub indicator_value: Option<f64>,
    pub measures: Measures,
    pub extra: Vec<Option<String>>,
}

/// Every critical value present and numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct Measured {
    pub year: String,
    pub year_start: i32,
    pub breakdown: String,
    pub level_description: String,
    pub indicator_value: f64,
    pub measures: Measures,
    pub extra: Vec<Option<String>>,
}

impl Measured {
    /// The CI ordering `lower_ci ≤ indicator_value ≤ upper_ci`. Only checked
    /// when both bounds are present.
    pub fn ci_is_ordered(&self) -> bool {
        match (self.measures.lower_ci, self.measures.upper_ci) {
            (Some(lo), Some(hi)) => lo <= self.indicator_value && self.indicator_value <= hi,
            _ => true,
        }
    }
}

/// A fully cleaned row. Built once by the derive stage and never edited.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub year: String,
    pub year_start: i32,
    pub financial_year: String,
    pub breakdown: String,
    pub level_description: String,
    pub indicator_value: f64,
    pub measures: Measures,
    pub ci_width: Option<f64>,
    pub high_uncertainty: bool,
    pub extra: Vec<Option<String>>,
}

impl CleanRecord {
    /// Numeric value of a canonical column, including the indicator.
    pub fn measure(&self, column: Canonical) -> Option<f64> {
        match column {
            Canonical::IndicatorValue => Some(self.indicator_value),
            other => self.measures.get(other),
        }
    }

    /// Text value of an identity column.
    pub fn identity(&self, column: Canonical) -> Option<&str> {
        match column {
            Canonical::Year => Some(&self.year),
            Canonical::Breakdown => Some(&self.breakdown),
            Canonical::LevelDescription => Some(&self.level_description),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measured(value: f64, lo: Option<f64>, hi: Option<f64>) -> Measured {
        Measured {
            year: "2020/21".into(),
            year_start: 2020,
            breakdown: "england".into(),
            level_description: "all".into(),
            indicator_value: value,
            measures: Measures {
                lower_ci: lo,
                upper_ci: hi,
                ..Measures::default()
            },
            extra: Vec::new(),
        }
    }

    #[test]
    fn ci_ordering_is_checked_only_with_both_bounds() {
        assert!(measured(120.0, Some(110.0), Some(130.0)).ci_is_ordered());
        assert!(measured(120.0, Some(120.0), Some(120.0)).ci_is_ordered());
        assert!(!measured(120.0, Some(125.0), Some(130.0)).ci_is_ordered());
        assert!(!measured(140.0, Some(110.0), Some(130.0)).ci_is_ordered());
        assert!(measured(120.0, None, Some(100.0)).ci_is_ordered());
        assert!(measured(120.0, Some(125.0), None).ci_is_ordered());
        assert!(measured(120.0, None, None).ci_is_ordered());
    }

    #[test]
    fn slots_cover_only_optional_measures() {
        let mut m = Measures::default();
        *m.slot_mut(Canonical::Observed).unwrap() = Some(4.0);
        assert_eq!(m.get(Canonical::Observed), Some(4.0));
        assert!(m.slot_mut(Canonical::IndicatorValue).is_none());
        assert!(m.slot_mut(Canonical::Year).is_none());
    }
}
