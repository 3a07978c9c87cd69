// src/analysis/trend.rs
//
// Trend summaries over one partition's indicator series: a least-squares
// line, year-on-year change, a centred rolling mean, start/end comparison
// per level, and a short linear forecast.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::process::{CleanTable, Partition};

/// Year-on-year changes beyond this many percent are not `Stable`.
const CHANGE_BAND_PCT: f64 = 5.0;
const ROLLING_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearPoint {
    pub year_start: i32,
    pub value: f64,
}

/// `value = slope * year_start + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub rmse: f64,
    pub n: usize,
}

impl LinearTrend {
    pub fn predict(&self, year_start: f64) -> f64 {
        self.slope * year_start + self.intercept
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeClass {
    Increase,
    Decrease,
    Stable,
}

impl ChangeClass {
    fn of(pct: f64) -> Self {
        if pct > CHANGE_BAND_PCT {
            ChangeClass::Increase
        } else if pct < -CHANGE_BAND_PCT {
            ChangeClass::Decrease
        } else {
            ChangeClass::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearChange {
    pub year_start: i32,
    pub value: f64,
    pub pct_change: Option<f64>,
    pub class: Option<ChangeClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointChange {
    pub level_description: String,
    pub start: f64,
    pub end: f64,
    pub pct_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub partition: String,
    pub points: Vec<YearPoint>,
    pub trend: Option<LinearTrend>,
    pub year_on_year: Vec<YearChange>,
    /// Centred 3-year mean of the year-on-year % change.
    pub rolling_mean: Vec<Option<f64>>,
    pub endpoints: Vec<EndpointChange>,
    pub forecast: Vec<YearPoint>,
}

fn pct_change(from: f64, to: f64) -> Option<f64> {
    (from != 0.0).then(|| (to - from) / from * 100.0)
}

/// Mean indicator value per `year_start`, ascending.
pub fn series(table: &CleanTable) -> Vec<YearPoint> {
    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for rec in &table.records {
        let slot = by_year.entry(rec.year_start).or_default();
        slot.0 += rec.indicator_value;
        slot.1 += 1;
    }
    by_year
        .into_iter()
        .map(|(year_start, (sum, n))| YearPoint {
            year_start,
            value: sum / n as f64,
        })
        .collect()
}

/// Ordinary least squares over `(year_start, value)`.
pub fn fit_linear(points: &[YearPoint]) -> Option<LinearTrend> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = points.iter().map(|p| p.year_start as f64).sum::<f64>() / nf;
    let mean_y = points.iter().map(|p| p.value).sum::<f64>() / nf;

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for p in points {
        let dx = p.year_start as f64 - mean_x;
        let dy = p.value - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let ss_res: f64 = points
        .iter()
        .map(|p| {
            let r = p.value - (slope * p.year_start as f64 + intercept);
            r * r
        })
        .sum();
    let r_squared = if syy == 0.0 { 1.0 } else { 1.0 - ss_res / syy };

    Some(LinearTrend {
        slope,
        intercept,
        r_squared,
        rmse: (ss_res / nf).sqrt(),
        n,
    })
}

pub fn year_on_year(points: &[YearPoint]) -> Vec<YearChange> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let pct = i
                .checked_sub(1)
                .and_then(|prev| pct_change(points[prev].value, p.value));
            YearChange {
                year_start: p.year_start,
                value: p.value,
                pct_change: pct,
                class: pct.map(ChangeClass::of),
            }
        })
        .collect()
}

/// Centred rolling mean. Position `i` averages `values[i - window/2 ..]`
/// over `window` entries; windows that run off either end, or hold a
/// `None`, give `None`.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let half = window / 2;
    (0..values.len())
        .map(|i| {
            if window == 0 || i < half || i - half + window > values.len() {
                return None;
            }
            let slice = &values[i - half..i - half + window];
            let sum = slice.iter().try_fold(0.0, |acc, v| v.map(|v| acc + v))?;
            Some(sum / window as f64)
        })
        .collect()
}

/// Per level: mean value in the earliest and latest year of `table`.
pub fn compare_endpoints(table: &CleanTable) -> Vec<EndpointChange> {
    let (Some(first), Some(last)) = (
        table.records.iter().map(|r| r.year_start).min(),
        table.records.iter().map(|r| r.year_start).max(),
    ) else {
        return Vec::new();
    };

    // level -> (start sum, start n, end sum, end n)
    let mut acc: BTreeMap<&str, (f64, usize, f64, usize)> = BTreeMap::new();
    for rec in &table.records {
        let slot = acc.entry(rec.level_description.as_str()).or_default();
        if rec.year_start == first {
            slot.0 += rec.indicator_value;
            slot.1 += 1;
        }
        if rec.year_start == last {
            slot.2 += rec.indicator_value;
            slot.3 += 1;
        }
    }

    acc.into_iter()
        .filter(|(_, (_, ns, _, ne))| *ns > 0 && *ne > 0)
        .map(|(level, (ss, ns, se, ne))| {
            let start = ss / ns as f64;
            let end = se / ne as f64;
            EndpointChange {
                level_description: level.to_string(),
                start,
                end,
                pct_change: pct_change(start, end),
            }
        })
        .collect()
}

pub fn forecast(trend: &LinearTrend, last_year: i32, horizon: usize) -> Vec<YearPoint> {
    (1..=horizon as i32)
        .map(|k| {
            let year_start = last_year + k;
            YearPoint {
                year_start,
                value: trend.predict(year_start as f64),
            }
        })
        .collect()
}

#[instrument(level = "debug", skip(partition), fields(partition = %partition.name))]
pub fn summarize(partition: &Partition, horizon: usize) -> TrendSummary {
    let points = series(&partition.table);
    let trend = fit_linear(&points);
    let forecast = match (trend.as_ref(), points.last()) {
        (Some(t), Some(last)) => forecast(t, last.year_start, horizon),
        _ => Vec::new(),
    };
    if let Some(t) = &trend {
        debug!(slope = t.slope, r_squared = t.r_squared, "fitted trend");
    }

    let yoy = year_on_year(&points);
    let pct: Vec<Option<f64>> = yoy.iter().map(|c| c.pct_change).collect();

    TrendSummary {
        partition: partition.name.clone(),
        rolling_mean: rolling_mean(&pct, ROLLING_WINDOW),
        year_on_year: yoy,
        endpoints: compare_endpoints(&partition.table),
        trend,
        forecast,
        points,
    }
}
