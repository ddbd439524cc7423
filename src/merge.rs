//! Merge the three normalized feeds into per-date observation rows.
//!
//! Every date present in any feed gets exactly one row. Each slot is filled from
//! its own feed when that feed has the date and left absent otherwise.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::data::FeedSet;
use crate::domain::{MergePolicy, Observation, Series, SeriesValues};
use crate::error::AppError;
use crate::store::KeyedStore;

/// What a merge wrote.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    pub rows_written: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Present values written per series, in slot order.
    pub per_series: [usize; 3],
}

/// Union the feeds' dates and build one row per date, ascending.
pub fn merge_feeds(feeds: &FeedSet) -> Vec<Observation> {
    let dates: BTreeSet<NaiveDate> = Series::ALL
        .iter()
        .flat_map(|&s| feeds.get(s).keys().copied())
        .collect();

    dates
        .into_iter()
        .map(|date| {
            Observation::new(
                date,
                SeriesValues::from_fn(|s| feeds.get(s).get(&date).copied()),
            )
        })
        .collect()
}

/// Merge `feeds` into `store` under `policy`.
///
/// `ReplaceRow` writes each merged row as-is, so a slot missing from today's
/// feeds becomes absent even if an earlier pull had stored a value for it.
/// `KeepExisting` fills such slots from the stored row instead.
pub fn merge_into(
    store: &mut dyn KeyedStore,
    feeds: &FeedSet,
    policy: MergePolicy,
) -> Result<MergeReport, AppError> {
    let mut rows = merge_feeds(feeds);

    if policy == MergePolicy::KeepExisting && !rows.is_empty() {
        // Single scan: `get` on the file store re-reads the whole document.
        let existing: BTreeMap<NaiveDate, Observation> = store
            .scan_all()?
            .into_iter()
            .map(|obs| (obs.date, obs))
            .collect();
        fill_absent_from(&mut rows, &existing);
    }

    store.upsert_many(&rows)?;

    let mut report = MergeReport {
        rows_written: rows.len(),
        first_date: rows.first().map(|r| r.date),
        last_date: rows.last().map(|r| r.date),
        per_series: [0; 3],
    };
    for row in &rows {
        for series in Series::ALL {
            if row.get(series).is_some() {
                report.per_series[series.index()] += 1;
            }
        }
    }

    info!(
        rows = report.rows_written,
        first = ?report.first_date,
        last = ?report.last_date,
        ?policy,
        "merged feeds into store"
    );
    Ok(report)
}

fn fill_absent_from(rows: &mut [Observation], existing: &BTreeMap<NaiveDate, Observation>) {
    for row in rows {
        let Some(stored) = existing.get(&row.date) else {
            continue;
        };
        for series in Series::ALL {
            if row.get(series).is_none() {
                row.values.set(series, stored.get(series));
            }
        }
    }
}
