//! Date-keyed observation storage.
//!
//! The pipeline only needs three things from a store: make sure it exists,
//! replace the row for a date, and scan every row in date order.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::Observation;
use crate::error::AppError;

pub mod json_file;

pub use json_file::JsonFileStore;

pub trait KeyedStore {
    /// Create the backing storage if it does not exist yet.
    fn ensure_schema(&mut self) -> Result<(), AppError>;

    fn get(&self, date: NaiveDate) -> Result<Option<Observation>, AppError>;

    /// Insert or fully replace the row for `obs.date`.
    fn upsert(&mut self, obs: &Observation) -> Result<(), AppError>;

    fn upsert_many(&mut self, rows: &[Observation]) -> Result<(), AppError> {
        for row in rows {
            self.upsert(row)?;
        }
        Ok(())
    }

    /// Every row, ascending by date.
    fn scan_all(&self) -> Result<Vec<Observation>, AppError>;
}

/// In-memory store; also the test double for the pipeline.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: BTreeMap<NaiveDate, Observation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl KeyedStore for MemoryStore {
    fn ensure_schema(&mut self) -> Result<(), AppError> {
        Ok(())
    }

    fn get(&self, date: NaiveDate) -> Result<Option<Observation>, AppError> {
        Ok(self.rows.get(&date).copied())
    }

    fn upsert(&mut self, obs: &Observation) -> Result<(), AppError> {
        self.rows.insert(obs.date, *obs);
        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<Observation>, AppError> {
        Ok(self.rows.values().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesValues;

    #[test]
    fn upsert_replaces_whole_row() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let mut store = MemoryStore::new();
        store
            .upsert(&Observation::new(
                date,
                SeriesValues { eurusd: Some(1.09), sp500: Some(470.0), treasury: Some(3.9) },
            ))
            .unwrap();
        store
            .upsert(&Observation::new(date, SeriesValues { eurusd: Some(1.10), ..Default::default() }))
            .unwrap();

        let row = store.get(date).unwrap().unwrap();
        assert_eq!(row.values.eurusd, Some(1.10));
        assert_eq!(row.values.sp500, None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn scan_is_date_ordered() {
        let mut store = MemoryStore::new();
        let rows: Vec<Observation> = [5u32, 1, 3]
            .iter()
            .map(|&day| Observation::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), SeriesValues::default()))
            .collect();
        store.upsert_many(&rows).unwrap();
        let days: Vec<u32> = store
            .scan_all()
            .unwrap()
            .iter()
            .map(|o| chrono::Datelike::day(&o.date))
            .collect();
        assert_eq!(days, vec![1, 3, 5]);
    }
}
