//! Observation store persisted as one JSON document.
//!
//! Layout: `{ "updated_at": <unix secs>, "records": [Observation, ...] }`,
//! records sorted by date with absent values written as `null`.
//!
//! Locking uses a sidecar `<store>.lock` file, since the document itself is
//! replaced by rename on every write. Reads hold it shared; `upsert_many` holds
//! it exclusively across the whole read-modify-write. The new document is
//! written to a temp file and renamed into place, so an interrupted run leaves
//! the previous document intact.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Observation;
use crate::error::AppError;
use crate::store::KeyedStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    updated_at: i64,
    records: Vec<Observation>,
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

/// Held lock on the sidecar file; released on drop.
struct StoreLock(File);

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.0.unlock();
    }
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a pull has created the store yet.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    fn lock_path(&self) -> PathBuf {
        self.sibling(".lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    fn ensure_parent(&self) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn lock(&self, exclusive: bool) -> Result<StoreLock, AppError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| AppError::Store(format!("Failed to open lock file: {e}")))?;
        let locked = if exclusive { file.lock_exclusive() } else { file.lock_shared() };
        locked.map_err(|e| AppError::Store(format!("Failed to acquire store lock: {e}")))?;
        Ok(StoreLock(file))
    }

    fn load(&self) -> Result<BTreeMap<NaiveDate, Observation>, AppError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let _guard = self.lock(false)?;
        self.read_document()
    }

    /// Caller holds the lock.
    fn read_document(&self) -> Result<BTreeMap<NaiveDate, Observation>, AppError> {
        let mut content = String::new();
        match File::open(&self.path) {
            Ok(file) => {
                std::io::BufReader::new(file)
                    .read_to_string(&mut content)
                    .map_err(|e| AppError::Store(format!("Failed to read store: {e}")))?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(AppError::Store(format!(
                    "Failed to open store '{}': {e}",
                    self.path.display()
                )));
            }
        }

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let doc: StoreDocument = serde_json::from_str(&content).map_err(|e| {
            AppError::Store(format!("Corrupted store file '{}': {e}", self.path.display()))
        })?;

        Ok(doc.records.into_iter().map(|r| (r.date, r)).collect())
    }

    /// Caller holds the exclusive lock.
    fn write_document(&self, rows: &BTreeMap<NaiveDate, Observation>) -> Result<(), AppError> {
        let doc = StoreDocument {
            updated_at: chrono::Utc::now().timestamp(),
            records: rows.values().copied().collect(),
        };
        let content = serde_json::to_string_pretty(&doc)
            .map_err(|e| AppError::Store(format!("Serialization failed: {e}")))?;

        let temp_path = self.temp_path();
        {
            let mut file = File::create(&temp_path)
                .map_err(|e| AppError::Store(format!("Failed to create temp file: {e}")))?;
            file.write_all(content.as_bytes())
                .map_err(|e| AppError::Store(format!("Failed to write temp file: {e}")))?;
            file.sync_all()
                .map_err(|e| AppError::Store(format!("Failed to sync temp file: {e}")))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| AppError::Store(format!("Failed to rename temp file: {e}")))?;

        debug!(rows = rows.len(), path = %self.path.display(), "store written");
        Ok(())
    }
}

impl KeyedStore for JsonFileStore {
    fn ensure_schema(&mut self) -> Result<(), AppError> {
        if self.exists() {
            return Ok(());
        }
        self.ensure_parent()?;
        let _guard = self.lock(true)?;
        if self.exists() {
            return Ok(());
        }
        self.write_document(&BTreeMap::new())
    }

    fn get(&self, date: NaiveDate) -> Result<Option<Observation>, AppError> {
        Ok(self.load()?.get(&date).copied())
    }

    fn upsert(&mut self, obs: &Observation) -> Result<(), AppError> {
        self.upsert_many(std::slice::from_ref(obs))
    }

    /// One read and one rewrite for the whole batch, under a single exclusive lock.
    fn upsert_many(&mut self, rows: &[Observation]) -> Result<(), AppError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.ensure_parent()?;
        let _guard = self.lock(true)?;
        let mut current = self.read_document()?;
        for row in rows {
            current.insert(row.date, *row);
        }
        self.write_document(&current)
    }

    fn scan_all(&self) -> Result<Vec<Observation>, AppError> {
        Ok(self.load()?.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::domain::SeriesValues;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn create_test_store() -> (JsonFileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("data").join("market_data.json"));
        (store, temp_dir)
    }

    #[test]
    fn ensure_schema_creates_empty_document() {
        let (mut store, _temp) = create_test_store();
        assert!(!store.exists());
        store.ensure_schema().unwrap();
        assert!(store.exists());
        assert!(store.scan_all().unwrap().is_empty());

        // A second call leaves existing rows alone.
        store
            .upsert(&Observation::new(d(2024, 1, 2), SeriesValues { sp500: Some(472.65), ..Default::default() }))
            .unwrap();
        store.ensure_schema().unwrap();
        assert_eq!(store.scan_all().unwrap().len(), 1);
    }

    #[test]
    fn rows_survive_reopen_with_absent_values() {
        let (mut store, _temp) = create_test_store();
        store.ensure_schema().unwrap();
        store
            .upsert_many(&[
                Observation::new(d(2024, 1, 3), SeriesValues { eurusd: Some(1.09), sp500: None, treasury: Some(3.91) }),
                Observation::new(d(2024, 1, 2), SeriesValues { eurusd: Some(1.10), sp500: Some(472.65), treasury: None }),
            ])
            .unwrap();

        let reopened = JsonFileStore::new(store.path().to_path_buf());
        let rows = reopened.scan_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, d(2024, 1, 2));
        assert_eq!(rows[1].values.sp500, None);
        assert_eq!(reopened.get(d(2024, 1, 3)).unwrap().unwrap().values.treasury, Some(3.91));

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"sp500\": null"));
    }

    #[test]
    fn upsert_replaces_existing_date() {
        let (mut store, _temp) = create_test_store();
        let date = d(2024, 1, 3);
        store
            .upsert(&Observation::new(date, SeriesValues { eurusd: Some(1.09), sp500: Some(470.0), treasury: Some(3.9) }))
            .unwrap();
        store
            .upsert(&Observation::new(date, SeriesValues { eurusd: Some(1.08), ..Default::default() }))
            .unwrap();

        let rows = store.scan_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values, SeriesValues { eurusd: Some(1.08), sp500: None, treasury: None });
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn writes_lock_a_sidecar_that_survives_the_rename() {
        let (mut store, _temp) = create_test_store();
        store.ensure_schema().unwrap();

        let held = store.lock(true).unwrap();
        let other = File::open(store.lock_path()).unwrap();
        assert!(other.try_lock_shared().is_err());
        drop(held);
        assert!(other.try_lock_shared().is_ok());
        other.unlock().unwrap();

        store
            .upsert(&Observation::new(d(2024, 1, 3), SeriesValues { eurusd: Some(1.09), ..Default::default() }))
            .unwrap();
        assert!(store.lock_path().exists());
        assert_eq!(store.scan_all().unwrap().len(), 1);
    }

    #[test]
    fn missing_file_scans_empty() {
        let (store, _temp) = create_test_store();
        assert!(store.scan_all().unwrap().is_empty());
        assert!(store.get(d(2024, 1, 3)).unwrap().is_none());
    }

    #[test]
    fn corrupt_document_is_a_store_error() {
        let (store, _temp) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();
        let err = store.scan_all().unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
    }
}
