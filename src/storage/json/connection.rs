//! File-system connection for the JSON month store.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use super::month_repository::MonthRepository;
use crate::domain::models::MonthKey;
use crate::storage::traits::{Connection, StorageError};

/// Manages the base directory holding one JSON file per month.
///
/// Initialization is idempotent: opening the same directory repeatedly is
/// safe and cheap, so a process can hold one connection and clone it freely.
#[derive(Clone)]
pub struct JsonConnection {
    base_directory: PathBuf,
}

impl JsonConnection {
    /// Open (creating if needed) a store rooted at `base_directory`.
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self, StorageError> {
        let base_directory = base_directory.as_ref().to_path_buf();
        let months_dir = base_directory.join("months");
        fs::create_dir_all(&months_dir).map_err(|source| StorageError::Init {
            path: months_dir.clone(),
            source,
        })?;
        Ok(Self { base_directory })
    }

    /// Open the store in the default per-user location, preferring the
    /// documents directory and falling back to the home directory.
    pub fn new_default() -> Result<Self, StorageError> {
        let parent = dirs::document_dir()
            .or_else(dirs::home_dir)
            .ok_or(StorageError::NoDataDirectory)?;
        let base = parent.join("SmartFinance");
        info!("Opening month store at {}", base.display());
        Self::new(base)
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn months_directory(&self) -> PathBuf {
        self.base_directory.join("months")
    }

    pub fn month_file_path(&self, key: &MonthKey) -> PathBuf {
        self.months_directory().join(format!("{}.json", key))
    }
}

impl Connection for JsonConnection {
    type MonthRepository = MonthRepository;

    fn create_month_repository(&self) -> Self::MonthRepository {
        MonthRepository::new(self.clone())
    }
}
