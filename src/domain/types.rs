//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - merged in-memory from the three provider feeds
//! - persisted in the observation store
//! - exported to JSON/CSV for downstream scripts

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One of the three tracked indicators.
///
/// Declaration order is the slot order of an [`Observation`] (A, B, C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Series {
    /// EUR/USD exchange rate.
    EurUsd,
    /// SPY daily close, standing in for the S&P 500.
    Sp500,
    /// 10-year US Treasury constant-maturity yield, in percent.
    Treasury10y,
}

impl Series {
    pub const ALL: [Series; 3] = [Series::EurUsd, Series::Sp500, Series::Treasury10y];

    /// Column name in the store and in exports.
    pub fn column(self) -> &'static str {
        match self {
            Series::EurUsd => "eurusd",
            Series::Sp500 => "sp500",
            Series::Treasury10y => "treasury",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Series::EurUsd => "EUR/USD",
            Series::Sp500 => "SPY",
            Series::Treasury10y => "10Y Treasury",
        }
    }

    /// Unit shown on chart axes.
    pub fn unit(self) -> &'static str {
        match self {
            Series::EurUsd => "USD per EUR",
            Series::Sp500 => "USD",
            Series::Treasury10y => "yield %",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Series::EurUsd => 0,
            Series::Sp500 => 1,
            Series::Treasury10y => 2,
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One optional value per series. `None` means "no value recorded", never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesValues {
    pub eurusd: Option<f64>,
    pub sp500: Option<f64>,
    pub treasury: Option<f64>,
}

impl SeriesValues {
    pub fn from_fn(mut f: impl FnMut(Series) -> Option<f64>) -> Self {
        Self {
            eurusd: f(Series::EurUsd),
            sp500: f(Series::Sp500),
            treasury: f(Series::Treasury10y),
        }
    }

    pub fn get(&self, series: Series) -> Option<f64> {
        match series {
            Series::EurUsd => self.eurusd,
            Series::Sp500 => self.sp500,
            Series::Treasury10y => self.treasury,
        }
    }

    pub fn set(&mut self, series: Series, value: Option<f64>) {
        match series {
            Series::EurUsd => self.eurusd = value,
            Series::Sp500 => self.sp500 = value,
            Series::Treasury10y => self.treasury = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        Series::ALL.iter().all(|&s| self.get(s).is_none())
    }
}

/// The unit of storage: one row per calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: SeriesValues,
}

impl Observation {
    pub fn new(date: NaiveDate, values: SeriesValues) -> Self {
        Self { date, values }
    }

    pub fn get(&self, series: Series) -> Option<f64> {
        self.values.get(series)
    }
}

/// Sparse `date -> value` mapping produced by the feed normalizer.
pub type NormalizedFeed = BTreeMap<NaiveDate, f64>;

/// How much history a pull asks the provider for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Only the current value, recorded under `today`.
    Daily { today: NaiveDate },
    /// Every observation on or after `since`.
    Historical { since: NaiveDate },
}

/// How a merged row is written over an existing record for the same date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Replace the whole row: slots absent from the incoming feeds become absent.
    #[default]
    ReplaceRow,
    /// Only overwrite slots the incoming feeds supply; keep stored values otherwise.
    KeepExisting,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_serializes_flat_with_nulls() {
        let obs = Observation::new(
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            SeriesValues {
                eurusd: Some(1.09),
                sp500: None,
                treasury: Some(3.91),
            },
        );
        let json = serde_json::to_string(&obs).unwrap();
        assert_eq!(
            json,
            r#"{"date":"2024-01-03","eurusd":1.09,"sp500":null,"treasury":3.91}"#
        );

        let back: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, obs);
    }

    #[test]
    fn absent_is_not_zero() {
        let mut values = SeriesValues::default();
        assert!(values.is_empty());
        values.set(Series::Sp500, Some(0.0));
        assert_eq!(values.get(Series::Sp500), Some(0.0));
        assert_eq!(values.get(Series::EurUsd), None);
        assert!(!values.is_empty());
    }

    #[test]
    fn slot_order_matches_index() {
        for (i, s) in Series::ALL.iter().enumerate() {
            assert_eq!(s.index(), i);
        }
    }
}
