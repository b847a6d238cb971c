//! CSV file backend for the response store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::record::ResponseRecord;
use super::table::Table;
use super::traits::ResponseStore;
use crate::error::PersistenceError;

/// Response store backed by a single CSV file with a header row.
///
/// Every append loads the whole file, adds the row and rewrites the file in
/// full.
pub struct CsvResponseStore {
    path: PathBuf,
}

impl CsvResponseStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn csv_err(&self, source: csv::Error) -> PersistenceError {
        PersistenceError::Csv {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read_table(&self) -> Result<Option<Table>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| self.csv_err(e))?;
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| self.csv_err(e))?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(PersistenceError::Malformed {
                path: self.path.display().to_string(),
                reason: "missing header row".to_string(),
            });
        }

        let mut table = Table::new(headers);
        for result in reader.records() {
            let record = result.map_err(|e| self.csv_err(e))?;
            table.rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Some(table))
    }

    fn write_table(&self, table: &Table) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let mut writer = csv::Writer::from_path(&self.path).map_err(|e| self.csv_err(e))?;
        writer
            .write_record(&table.headers)
            .map_err(|e| self.csv_err(e))?;
        for row in &table.rows {
            writer.write_record(row).map_err(|e| self.csv_err(e))?;
        }
        writer.flush().map_err(|e| self.io_err(e))?;
        Ok(())
    }

    fn append_blocking(&self, record: &ResponseRecord) -> Result<usize, PersistenceError> {
        let mut table = self.read_table()?.unwrap_or_default();
        table.push(record.cells());
        self.write_table(&table)?;
        Ok(table.len())
    }

    fn reset_blocking(&self) -> Result<(), PersistenceError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, PersistenceError>
    where
        T: Send + 'static,
        F: FnOnce(CsvResponseStore) -> Result<T, PersistenceError> + Send + 'static,
    {
        let store = CsvResponseStore::new(self.path.clone());
        tokio::task::spawn_blocking(move || f(store))
            .await
            .map_err(|e| self.io_err(std::io::Error::other(e)))?
    }
}

#[async_trait]
impl ResponseStore for CsvResponseStore {
    async fn append(&self, record: &ResponseRecord) -> Result<(), PersistenceError> {
        let record = record.clone();
        let id = record.id;
        let rows = self
            .blocking(move |store| store.append_blocking(&record))
            .await?;
        tracing::info!(record_id = %id, rows, path = %self.path.display(), "Persisted intake response");
        Ok(())
    }

    async fn load(&self) -> Result<Option<Table>, PersistenceError> {
        self.blocking(|store| store.read_table()).await
    }

    async fn reset(&self) -> Result<(), PersistenceError> {
        self.blocking(|store| store.reset_blocking()).await?;
        tracing::info!(path = %self.path.display(), "Response store reset");
        Ok(())
    }
}
