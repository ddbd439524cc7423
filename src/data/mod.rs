//! Market-data feeds.
//!
//! - provider response normalization (`normalize`)
//! - Alpha Vantage HTTP client (`alpha_vantage`)
//! - the `MarketDataFeed` seam the pull pipeline depends on

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{FetchMode, NormalizedFeed, Series};
use crate::error::AppError;

pub mod alpha_vantage;
pub mod normalize;

pub use alpha_vantage::AlphaVantageClient;
pub use normalize::{FeedShape, normalize};

/// Source of normalized per-series feeds.
///
/// An empty feed means "no data"; transport and decoding failures are
/// `AppError::FeedUnavailable`.
pub trait MarketDataFeed {
    /// Current value only, recorded under `today`.
    fn fetch_point(&self, series: Series, today: NaiveDate) -> Result<NormalizedFeed, AppError>;

    /// Date-keyed series response.
    fn fetch_series(&self, series: Series, mode: FetchMode) -> Result<NormalizedFeed, AppError>;

    /// List-of-records response.
    fn fetch_list_series(&self, series: Series, mode: FetchMode) -> Result<NormalizedFeed, AppError>;

    /// Route a series to the provider call that serves it in `mode`.
    fn fetch(&self, series: Series, mode: FetchMode) -> Result<NormalizedFeed, AppError> {
        match (series, mode) {
            (Series::EurUsd, FetchMode::Daily { today }) => self.fetch_point(series, today),
            (Series::EurUsd, FetchMode::Historical { .. }) | (Series::Sp500, _) => {
                self.fetch_series(series, mode)
            }
            (Series::Treasury10y, _) => self.fetch_list_series(series, mode),
        }
    }
}

/// The three normalized feeds of one pull, in slot order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSet {
    pub eurusd: NormalizedFeed,
    pub sp500: NormalizedFeed,
    pub treasury: NormalizedFeed,
}

impl FeedSet {
    pub fn get(&self, series: Series) -> &NormalizedFeed {
        match series {
            Series::EurUsd => &self.eurusd,
            Series::Sp500 => &self.sp500,
            Series::Treasury10y => &self.treasury,
        }
    }

    pub fn get_mut(&mut self, series: Series) -> &mut NormalizedFeed {
        match series {
            Series::EurUsd => &mut self.eurusd,
            Series::Sp500 => &mut self.sp500,
            Series::Treasury10y => &mut self.treasury,
        }
    }

    pub fn is_empty(&self) -> bool {
        Series::ALL.iter().all(|&s| self.get(s).is_empty())
    }
}

/// Fetch all three series before returning anything.
///
/// The first failure aborts the whole pull, so a caller never writes a partial set.
pub fn fetch_all(feed: &dyn MarketDataFeed, mode: FetchMode) -> Result<FeedSet, AppError> {
    let mut set = FeedSet::default();
    for series in Series::ALL {
        let values = feed.fetch(series, mode)?;
        info!(series = series.column(), observations = values.len(), "fetched feed");
        *set.get_mut(series) = values;
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Records which provider call each series was routed to.
    #[derive(Default)]
    struct RoutingFeed {
        calls: RefCell<Vec<(&'static str, Series)>>,
        fail_on: Option<Series>,
    }

    impl RoutingFeed {
        fn answer(&self, kind: &'static str, series: Series, date: NaiveDate) -> Result<NormalizedFeed, AppError> {
            self.calls.borrow_mut().push((kind, series));
            if self.fail_on == Some(series) {
                return Err(AppError::FeedUnavailable("boom".into()));
            }
            Ok(NormalizedFeed::from([(date, 1.0)]))
        }
    }

    impl MarketDataFeed for RoutingFeed {
        fn fetch_point(&self, series: Series, today: NaiveDate) -> Result<NormalizedFeed, AppError> {
            self.answer("point", series, today)
        }

        fn fetch_series(&self, series: Series, mode: FetchMode) -> Result<NormalizedFeed, AppError> {
            self.answer("series", series, mode_date(mode))
        }

        fn fetch_list_series(&self, series: Series, mode: FetchMode) -> Result<NormalizedFeed, AppError> {
            self.answer("list", series, mode_date(mode))
        }
    }

    fn mode_date(mode: FetchMode) -> NaiveDate {
        match mode {
            FetchMode::Daily { today } => today,
            FetchMode::Historical { since } => since,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn daily_routes_fx_to_point() {
        let feed = RoutingFeed::default();
        let set = fetch_all(&feed, FetchMode::Daily { today: d(2024, 1, 3) }).unwrap();
        assert_eq!(
            *feed.calls.borrow(),
            vec![
                ("point", Series::EurUsd),
                ("series", Series::Sp500),
                ("list", Series::Treasury10y),
            ]
        );
        assert!(!set.is_empty());
    }

    #[test]
    fn historical_routes_fx_to_series() {
        let feed = RoutingFeed::default();
        fetch_all(&feed, FetchMode::Historical { since: d(2001, 1, 1) }).unwrap();
        assert_eq!(feed.calls.borrow()[0], ("series", Series::EurUsd));
    }

    #[test]
    fn first_failure_aborts() {
        let feed = RoutingFeed {
            fail_on: Some(Series::Sp500),
            ..Default::default()
        };
        let err = fetch_all(&feed, FetchMode::Daily { today: d(2024, 1, 3) }).unwrap_err();
        assert!(matches!(err, AppError::FeedUnavailable(_)));
        assert_eq!(feed.calls.borrow().len(), 2);
    }
}
