//! # SmartFinance
//!
//! A personal budgeting engine built around month records: each calendar
//! month carries its income, daily expenses, recurring commitments, and
//! investments, and is materialized lazily by inheriting from the nearest
//! earlier month. Services on top derive summaries, propagate recurring
//! changes forward, and export the history as CSV or a JSON backup.
//!
//! Storage is pluggable behind the traits in [`storage`]; the bundled
//! backend keeps one JSON file per month on disk.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

pub mod domain;
pub mod storage;

pub use storage::JsonConnection;

/// Main engine struct that orchestrates all services over one connection.
pub struct Engine {
    pub month_service: domain::MonthService<JsonConnection>,
    pub entry_service: domain::EntryService<JsonConnection>,
    pub recurring_service: domain::RecurringService<JsonConnection>,
    pub summary_service: domain::SummaryService<JsonConnection>,
    pub export_service: domain::ExportService<JsonConnection>,
    pub backup_service: domain::BackupService<JsonConnection>,
}

impl Engine {
    /// Create an engine storing data under the user's documents directory.
    pub fn new() -> Result<Self> {
        let connection = Arc::new(JsonConnection::new_default()?);
        Ok(Self::with_connection(connection))
    }

    /// Create an engine storing data under `base_directory`.
    pub fn with_directory(base_directory: &Path) -> Result<Self> {
        let connection = Arc::new(JsonConnection::new(base_directory)?);
        Ok(Self::with_connection(connection))
    }

    pub fn with_connection(connection: Arc<JsonConnection>) -> Self {
        Self {
            month_service: domain::MonthService::new(connection.clone()),
            entry_service: domain::EntryService::new(connection.clone()),
            recurring_service: domain::RecurringService::new(connection.clone()),
            summary_service: domain::SummaryService::new(connection.clone()),
            export_service: domain::ExportService::new(connection.clone()),
            backup_service: domain::BackupService::new(connection),
        }
    }
}
