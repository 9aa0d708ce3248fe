//! Storage abstraction for month records.
//!
//! The domain layer works against these traits so that different backends
//! (JSON files today, anything keyed tomorrow) can be swapped in without
//! touching business logic. All operations are synchronous: mutations come
//! from a single logical actor, one at a time.

use std::path::PathBuf;

use crate::domain::models::{MonthKey, MonthRecord};

/// Persistence failures. The caller must not assume a write took effect
/// unless the operation returned `Ok`.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to initialize store at {path}")]
    Init {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O failure on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Corrupt month record at {path}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Could not determine a data directory for the store")]
    NoDataDirectory,
}

/// A month record as loaded from the store.
///
/// `migrated` reports whether the stored form differed from the canonical
/// schema, so the inheritance resolver can rewrite legacy records exactly
/// once instead of on every read.
#[derive(Debug, Clone)]
pub struct LoadedMonth {
    pub record: MonthRecord,
    pub migrated: bool,
}

/// Keyed persistence of one record per calendar month.
pub trait MonthStorage: Send + Sync {
    /// Pure read: no synthesis, no side effects. Legacy shapes are migrated
    /// in memory and flagged, never written back here.
    fn get_month(&self, key: &MonthKey) -> Result<Option<LoadedMonth>, StorageError>;

    /// Upsert keyed by `record.id`. Total overwrite, last writer wins.
    fn store_month(&self, record: &MonthRecord) -> Result<(), StorageError>;

    /// All records in store-native order. Callers needing chronological
    /// order must sort by `id` explicitly.
    fn list_months(&self) -> Result<Vec<MonthRecord>, StorageError>;

    /// Delete every record unconditionally. Irreversible.
    fn clear_all(&self) -> Result<(), StorageError>;
}

/// Factory trait abstracting the concrete connection type, so services can
/// be generic over the storage backend.
pub trait Connection: Send + Sync + Clone {
    type MonthRepository: MonthStorage + Clone;

    fn create_month_repository(&self) -> Self::MonthRepository;
}
