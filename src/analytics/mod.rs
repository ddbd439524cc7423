//! Summary statistics over the stored series.
//!
//! Everything here works on a plain ascending slice of [`Observation`]s and
//! skips absent values; an absent value is never treated as zero.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::domain::{Observation, Series, SeriesValues};
use crate::error::AppError;

/// Lookback used for the year-over-year comparison.
pub const YOY_LOOKBACK_DAYS: u64 = 365;

/// Year-over-year change against the nearest observation at or before one year ago.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearOverYear {
    pub target_date: NaiveDate,
    pub comparison: Observation,
    /// Percent change per series; absent when either side is absent or the base is zero.
    pub change_pct: SeriesValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub latest: Observation,
    pub window_days: u32,
    pub trailing_average: SeriesValues,
    /// `None` when the store holds no observation a year before the latest one.
    pub year_over_year: Option<YearOverYear>,
}

/// Compute the full summary. Fails with `NoData` on an empty slice.
pub fn summarize(records: &[Observation], window_days: u32) -> Result<Summary, AppError> {
    if window_days == 0 {
        return Err(AppError::Config("trailing window must be at least 1 day".into()));
    }
    let latest = *latest(records)?;
    Ok(Summary {
        latest,
        window_days,
        trailing_average: trailing_average(records, latest.date, window_days),
        year_over_year: year_over_year(records, &latest),
    })
}

/// The record with the greatest date.
pub fn latest(records: &[Observation]) -> Result<&Observation, AppError> {
    records
        .iter()
        .max_by_key(|r| r.date)
        .ok_or_else(|| AppError::NoData("the store has no observations; run `mkt pull` first".into()))
}

/// Mean of present values per series over `[latest_date - (window_days - 1), latest_date]`.
pub fn trailing_average(records: &[Observation], latest_date: NaiveDate, window_days: u32) -> SeriesValues {
    let start = days_before(latest_date, u64::from(window_days.max(1) - 1));
    let window: Vec<&Observation> = records
        .iter()
        .filter(|r| r.date >= start && r.date <= latest_date)
        .collect();

    SeriesValues::from_fn(|series| mean(window.iter().filter_map(|r| r.get(series))))
}

/// Percent change from the nearest record at or before `latest.date - 365 days`.
pub fn year_over_year(records: &[Observation], latest: &Observation) -> Option<YearOverYear> {
    let target_date = yoy_target_date(latest.date)?;
    let comparison = records
        .iter()
        .filter(|r| r.date <= target_date)
        .max_by_key(|r| r.date)?;

    let change_pct = SeriesValues::from_fn(|series| pct_change(latest.get(series), comparison.get(series)));

    Some(YearOverYear {
        target_date,
        comparison: *comparison,
        change_pct,
    })
}

/// `latest_date - 365 days`; `None` only for dates at the very start of the calendar.
pub fn yoy_target_date(latest_date: NaiveDate) -> Option<NaiveDate> {
    latest_date.checked_sub_days(Days::new(YOY_LOOKBACK_DAYS))
}

/// Records dated within `days` of the last record (inclusive), for plotting.
pub fn recent_window(records: &[Observation], days: u32) -> &[Observation] {
    let Some(last) = records.last() else {
        return records;
    };
    let start = days_before(last.date, u64::from(days));
    let idx = records.partition_point(|r| r.date < start);
    &records[idx..]
}

/// Present `(date, value)` points for one series.
pub fn points(records: &[Observation], series: Series) -> Vec<(NaiveDate, f64)> {
    records
        .iter()
        .filter_map(|r| r.get(series).map(|v| (r.date, v)))
        .collect()
}

/// `date - days`, saturating at the earliest representable date.
fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { None } else { Some(sum / n as f64) }
}

fn pct_change(current: Option<f64>, base: Option<f64>) -> Option<f64> {
    let (current, base) = (current?, base?);
    if base == 0.0 {
        return None;
    }
    Some((current - base) / base * 100.0)
}
