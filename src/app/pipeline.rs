//! Shared pull and summary workflows used by the CLI and the TUI.
//!
//! Pull: fetch all three feeds -> merge by date -> upsert into the store.
//! Summary: scan the store -> latest / trailing average / year-over-year.

use tracing::info;

use crate::analytics::{self, Summary};
use crate::data::{MarketDataFeed, fetch_all};
use crate::domain::{FetchMode, MergePolicy};
use crate::error::AppError;
use crate::merge::{MergeReport, merge_into};
use crate::store::KeyedStore;

/// Fetch every series, then write. A failed fetch leaves the store untouched.
pub fn run_pull(
    feed: &dyn MarketDataFeed,
    store: &mut dyn KeyedStore,
    mode: FetchMode,
    policy: MergePolicy,
) -> Result<MergeReport, AppError> {
    info!(?mode, "starting pull");
    let feeds = fetch_all(feed, mode)?;

    store.ensure_schema()?;
    merge_into(store, &feeds, policy)
}

/// Read the whole store and summarize it.
pub fn run_summary(store: &dyn KeyedStore, window_days: u32) -> Result<Summary, AppError> {
    let records = store.scan_all()?;
    analytics::summarize(&records, window_days)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{NormalizedFeed, Series};
    use crate::store::MemoryStore;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Canned feeds per series; a series listed in `failing` errors out.
    #[derive(Default)]
    struct FakeFeed {
        feeds: HashMap<Series, NormalizedFeed>,
        failing: Option<Series>,
    }

    impl FakeFeed {
        fn answer(&self, series: Series) -> Result<NormalizedFeed, AppError> {
            if self.failing == Some(series) {
                return Err(AppError::FeedUnavailable(format!("{} timed out", series.label())));
            }
            Ok(self.feeds.get(&series).cloned().unwrap_or_default())
        }
    }

    impl MarketDataFeed for FakeFeed {
        fn fetch_point(&self, series: Series, _today: NaiveDate) -> Result<NormalizedFeed, AppError> {
            self.answer(series)
        }

        fn fetch_series(&self, series: Series, _mode: FetchMode) -> Result<NormalizedFeed, AppError> {
            self.answer(series)
        }

        fn fetch_list_series(&self, series: Series, _mode: FetchMode) -> Result<NormalizedFeed, AppError> {
            self.answer(series)
        }
    }

    fn history_feed() -> FakeFeed {
        let mut feeds = HashMap::new();
        feeds.insert(
            Series::EurUsd,
            NormalizedFeed::from([(d(2023, 1, 1), 100.0), (d(2023, 6, 15), 90.0), (d(2024, 1, 3), 110.0)]),
        );
        feeds.insert(Series::Sp500, NormalizedFeed::from([(d(2024, 1, 2), 472.65)]));
        FakeFeed { feeds, failing: None }
    }

    #[test]
    fn pull_then_summary() {
        let mut store = MemoryStore::new();
        let mode = FetchMode::Historical { since: d(2001, 1, 1) };
        let report = run_pull(&history_feed(), &mut store, mode, MergePolicy::ReplaceRow).unwrap();
        assert_eq!(report.rows_written, 4);

        let summary = run_summary(&store, 7).unwrap();
        assert_eq!(summary.latest.date, d(2024, 1, 3));
        assert_eq!(summary.latest.values.sp500, None);
        assert_eq!(summary.trailing_average.sp500, Some(472.65));
        let yoy = summary.year_over_year.unwrap();
        assert_eq!(yoy.comparison.date, d(2023, 1, 1));
        assert!((yoy.change_pct.eurusd.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn failed_fetch_writes_nothing() {
        let mut store = MemoryStore::new();
        let mut feed = history_feed();
        feed.failing = Some(Series::Treasury10y);

        let err = run_pull(&feed, &mut store, FetchMode::Daily { today: d(2024, 1, 3) }, MergePolicy::ReplaceRow)
            .unwrap_err();
        assert!(matches!(err, AppError::FeedUnavailable(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn summary_on_empty_store_is_no_data() {
        let store = MemoryStore::new();
        assert!(run_summary(&store, 7).unwrap_err().is_no_data());
    }

    #[test]
    fn repeated_pull_is_idempotent() {
        let feed = history_feed();
        let mode = FetchMode::Historical { since: d(2001, 1, 1) };
        let mut store = MemoryStore::new();
        run_pull(&feed, &mut store, mode, MergePolicy::ReplaceRow).unwrap();
        let first = store.scan_all().unwrap();
        run_pull(&feed, &mut store, mode, MergePolicy::ReplaceRow).unwrap();
        assert_eq!(store.scan_all().unwrap(), first);
    }
}
