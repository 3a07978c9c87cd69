// src/analysis/mod.rs

pub mod missing;
pub mod trend;

pub use missing::{ColumnMissing, MissingReport};
pub use trend::{
    compare_endpoints, fit_linear, forecast, rolling_mean, series, summarize, year_on_year,
    ChangeClass, EndpointChange, LinearTrend, TrendSummary, YearChange, YearPoint,
};
