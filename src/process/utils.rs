// src/process/utils.rs

/// Trim whitespace; an empty result counts as missing.
pub fn clean_str(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// `"2019/20"` → 2019, `"2019"` → 2019, `"abc"` → None.
pub fn parse_year_start(year: &str) -> Option<i32> {
    year.split('/').next()?.trim().parse().ok()
}

/// 2019 → `"2019/20"`, 2099 → `"2099/00"`.
pub fn financial_year(year_start: i32) -> String {
    format!("{}/{:02}", year_start, (year_start + 1).rem_euclid(100))
}

/// File-safe partition name: spaces and `/` become `_`.
pub fn partition_name(breakdown: &str) -> String {
    breakdown.replace([' ', '/'], "_")
}

/// Median of `values`; the mean of the two middle values for an even count.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Quantile with linear interpolation between closest ranks
/// (`q` in `[0, 1]`).
pub fn quantile(values: &mut [f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(values[lo] + (values[hi] - values[lo]) * frac)
}
