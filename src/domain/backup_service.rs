//! Backup codec: full-fidelity export and import of the month collection.
//!
//! Export produces a versioned JSON envelope holding every month record.
//! Import accepts the envelope or a bare array of records (the shape older
//! backups used), parses and validates the *entire* payload before writing
//! anything, then upserts record by record — a duplicate key in the payload
//! resolves to its last occurrence, matching upsert semantics.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::domain::models::{MonthKey, MonthRecord};
use crate::domain::schema;
use crate::storage::{Connection, MonthStorage, StorageError};

const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct BackupEnvelope {
    version: u32,
    exported_at: DateTime<Utc>,
    months: Vec<MonthRecord>,
}

/// Import failures. Parse failures abort before any write; a storage failure
/// mid-import aborts with already-written records standing.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Backup payload is not valid JSON")]
    InvalidJson(#[source] serde_json::Error),
    #[error("Backup payload has an unrecognized shape")]
    UnrecognizedShape,
    #[error("Backup record {index} is malformed")]
    MalformedRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to store month {key} during import")]
    Storage {
        key: MonthKey,
        #[source]
        source: StorageError,
    },
}

#[derive(Clone)]
pub struct BackupService<C: Connection> {
    month_repository: C::MonthRepository,
}

impl<C: Connection> BackupService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            month_repository: connection.create_month_repository(),
        }
    }

    /// Serialize every stored month, full fidelity.
    pub fn export_backup(&self) -> Result<String> {
        let mut months = self.month_repository.list_months()?;
        months.sort_by_key(|m| m.id);
        let envelope = BackupEnvelope {
            version: BACKUP_VERSION,
            exported_at: Utc::now(),
            months,
        };
        let blob = serde_json::to_string_pretty(&envelope)?;
        info!(
            "Exported backup of {} month(s) ({} bytes)",
            envelope.months.len(),
            blob.len()
        );
        Ok(blob)
    }

    /// Restore a backup blob into the store. Returns the number of records
    /// written. Overwrites by key with no merge; whether a restore is safe to
    /// run at all is the caller's decision (see the sync policy).
    pub fn import_backup(&self, blob: &str) -> Result<usize, ImportError> {
        let records = parse_backup(blob)?;
        let count = records.len();
        for record in &records {
            self.month_repository
                .store_month(record)
                .map_err(|source| ImportError::Storage {
                    key: record.id,
                    source,
                })?;
        }
        info!("Imported {} month record(s) from backup", count);
        Ok(count)
    }
}

/// Parse and validate a backup payload without touching storage.
///
/// Accepts the versioned envelope or a bare array of month records; each
/// record goes through schema migration, so legacy backups restore cleanly.
fn parse_backup(blob: &str) -> Result<Vec<MonthRecord>, ImportError> {
    let value: Value = serde_json::from_str(blob).map_err(ImportError::InvalidJson)?;

    let raw_months: &Vec<Value> = match &value {
        Value::Array(months) => months,
        Value::Object(map) => match map.get("months") {
            Some(Value::Array(months)) => months,
            _ => return Err(ImportError::UnrecognizedShape),
        },
        _ => return Err(ImportError::UnrecognizedShape),
    };

    let mut records = Vec::with_capacity(raw_months.len());
    for (index, raw) in raw_months.iter().enumerate() {
        let (record, _migrated) = schema::migrate_month(raw)
            .map_err(|source| ImportError::MalformedRecord { index, source })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::RecurringItem;
    use crate::storage::JsonConnection;
    use tempfile::TempDir;

    fn fixture() -> (BackupService<JsonConnection>, Arc<JsonConnection>, TempDir) {
        let dir = TempDir::new().unwrap();
        let connection = Arc::new(JsonConnection::new(dir.path()).unwrap());
        (BackupService::new(connection.clone()), connection, dir)
    }

    fn sample_record(key: &str, base: f64) -> MonthRecord {
        let mut record = MonthRecord::empty(key.parse().unwrap());
        record.income.base = base;
        record.recurring_monthly.push(RecurringItem {
            name: "Rent".into(),
            amount: 8000.0,
            created_at: 1,
        });
        record
    }

    #[test]
    fn export_then_import_restores_full_fidelity() {
        let (service, conn, _dir) = fixture();
        let repo = conn.create_month_repository();
        repo.store_month(&sample_record("2025-01", 50000.0)).unwrap();
        repo.store_month(&sample_record("2025-02", 52000.0)).unwrap();

        let blob = service.export_backup().unwrap();

        repo.clear_all().unwrap();
        assert!(repo.list_months().unwrap().is_empty());

        let imported = service.import_backup(&blob).unwrap();
        assert_eq!(imported, 2);

        let mut months = repo.list_months().unwrap();
        months.sort_by_key(|m| m.id);
        assert_eq!(months[0], sample_record("2025-01", 50000.0));
        assert_eq!(months[1], sample_record("2025-02", 52000.0));
    }

    #[test]
    fn import_accepts_a_bare_array_with_legacy_shapes() {
        let (service, conn, _dir) = fixture();
        let blob = r#"[
            {"id": "2024-07", "income": 42000, "monthlyRecurring": [{"name": "Rent", "amount": 800, "ts": 17}]}
        ]"#;
        let imported = service.import_backup(blob).unwrap();
        assert_eq!(imported, 1);

        let repo = conn.create_month_repository();
        let loaded = repo
            .get_month(&"2024-07".parse().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.record.income.base, 42000.0);
        // Stored canonically, so re-reading reports no migration.
        assert!(!loaded.migrated);
    }

    #[test]
    fn duplicate_keys_resolve_to_the_last_occurrence() {
        let (service, conn, _dir) = fixture();
        let blob = r#"[
            {"id": "2025-01", "income": {"base": 1000.0, "extras": []}},
            {"id": "2025-01", "income": {"base": 2000.0, "extras": []}}
        ]"#;
        service.import_backup(blob).unwrap();

        let repo = conn.create_month_repository();
        let months = repo.list_months().unwrap();
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].income.base, 2000.0);
    }

    #[test]
    fn malformed_payload_aborts_before_any_write() {
        let (service, conn, _dir) = fixture();
        let repo = conn.create_month_repository();
        repo.store_month(&sample_record("2025-01", 50000.0)).unwrap();

        // One good record, one with a broken key: nothing may change.
        let blob = r#"[
            {"id": "2025-02", "income": {"base": 9.0, "extras": []}},
            {"id": "not-a-month"}
        ]"#;
        let err = service.import_backup(blob).unwrap_err();
        assert!(matches!(err, ImportError::MalformedRecord { index: 1, .. }));

        let months = repo.list_months().unwrap();
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].id.to_string(), "2025-01");
    }

    #[test]
    fn non_json_and_wrong_shapes_are_rejected() {
        let (service, _conn, _dir) = fixture();
        assert!(matches!(
            service.import_backup("not json").unwrap_err(),
            ImportError::InvalidJson(_)
        ));
        assert!(matches!(
            service.import_backup("42").unwrap_err(),
            ImportError::UnrecognizedShape
        ));
        assert!(matches!(
            service.import_backup(r#"{"nope": []}"#).unwrap_err(),
            ImportError::UnrecognizedShape
        ));
    }
}
