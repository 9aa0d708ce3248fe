//! JSON file-backed month repository.
//!
//! One pretty-printed JSON file per month under `<base>/months/`. Writes go
//! through a temp file followed by an atomic rename, so a crash mid-write
//! never leaves a truncated record behind.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};

use log::warn;
use serde_json::Value;

use super::connection::JsonConnection;
use crate::domain::models::{MonthKey, MonthRecord};
use crate::domain::schema;
use crate::storage::traits::{LoadedMonth, MonthStorage, StorageError};

#[derive(Clone)]
pub struct MonthRepository {
    connection: JsonConnection,
}

impl MonthRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }

    fn read_month_file(&self, key: &MonthKey) -> Result<Option<Value>, StorageError> {
        let path = self.connection.month_file_path(key);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        let reader = BufReader::new(file);
        let raw: Value =
            serde_json::from_reader(reader).map_err(|source| StorageError::Corrupt {
                path,
                source,
            })?;
        Ok(Some(raw))
    }
}

impl MonthStorage for MonthRepository {
    fn get_month(&self, key: &MonthKey) -> Result<Option<LoadedMonth>, StorageError> {
        let raw = match self.read_month_file(key)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let path = self.connection.month_file_path(key);
        let (record, migrated) =
            schema::migrate_month(&raw).map_err(|source| StorageError::Corrupt {
                path,
                source,
            })?;
        Ok(Some(LoadedMonth { record, migrated }))
    }

    fn store_month(&self, record: &MonthRecord) -> Result<(), StorageError> {
        let path = self.connection.month_file_path(&record.id);
        let temp_path = path.with_extension("tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|source| StorageError::Io {
                    path: temp_path.clone(),
                    source,
                })?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, record).map_err(|source| {
                StorageError::Corrupt {
                    path: temp_path.clone(),
                    source,
                }
            })?;
            writer.flush().map_err(|source| StorageError::Io {
                path: temp_path.clone(),
                source,
            })?;
        }

        fs::rename(&temp_path, &path).map_err(|source| StorageError::Io { path, source })
    }

    fn list_months(&self) -> Result<Vec<MonthRecord>, StorageError> {
        let months_dir = self.connection.months_directory();
        let entries = fs::read_dir(&months_dir).map_err(|source| StorageError::Io {
            path: months_dir.clone(),
            source,
        })?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StorageError::Io {
                path: months_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let key: MonthKey = match path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse().ok())
            {
                Some(key) => key,
                None => {
                    warn!("Skipping foreign file in month store: {}", path.display());
                    continue;
                }
            };
            if let Some(loaded) = self.get_month(&key)? {
                records.push(loaded.record);
            }
        }
        Ok(records)
    }

    fn clear_all(&self) -> Result<(), StorageError> {
        let months_dir = self.connection.months_directory();
        let entries = fs::read_dir(&months_dir).map_err(|source| StorageError::Io {
            path: months_dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| StorageError::Io {
                path: months_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                fs::remove_file(&path).map_err(|source| StorageError::Io { path, source })?;
            }
        }
        Ok(())
    }
}
