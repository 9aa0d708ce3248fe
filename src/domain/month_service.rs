//! Month lifecycle service: lazy creation with inheritance.
//!
//! A month record is materialized on first access. A new month inherits its
//! recurring obligations, base income and investment buckets from the nearest
//! *earlier* existing month — not strictly month minus one, so that skipping
//! the app for a month (or three) still carries bills forward correctly.

use anyhow::Result;
use log::info;
use std::sync::Arc;

use crate::domain::models::{MonthKey, MonthRecord};
use crate::storage::{Connection, MonthStorage, StorageError};

#[derive(Clone)]
pub struct MonthService<C: Connection> {
    month_repository: C::MonthRepository,
}

impl<C: Connection> MonthService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        let month_repository = connection.create_month_repository();
        Self { month_repository }
    }

    pub(crate) fn repository(&self) -> &C::MonthRepository {
        &self.month_repository
    }

    /// Fetch the record for `key`, creating it if absent.
    ///
    /// Existing records are normalized to the canonical schema and re-persisted
    /// only when the stored form actually changed, so calling `ensure` twice
    /// returns identical records and issues no redundant write. Synthesized
    /// records are persisted immediately, making repeated calls idempotent.
    pub fn ensure(&self, key: &MonthKey) -> Result<MonthRecord> {
        if let Some(loaded) = self.month_repository.get_month(key)? {
            if loaded.migrated {
                info!("Rewriting legacy schema for month {}", key);
                self.month_repository.store_month(&loaded.record)?;
            }
            return Ok(loaded.record);
        }

        let record = match self.last_known_truth(key)? {
            Some(prior) => {
                info!("Materializing month {} from {}", key, prior.id);
                MonthRecord::inherit_from(*key, &prior)
            }
            None => {
                info!("Materializing month {} with no prior history", key);
                MonthRecord::empty(*key)
            }
        };
        self.month_repository.store_month(&record)?;
        Ok(record)
    }

    /// The most recent existing month strictly before `key`, tolerating gaps.
    fn last_known_truth(&self, key: &MonthKey) -> Result<Option<MonthRecord>, StorageError> {
        let months = self.month_repository.list_months()?;
        Ok(months
            .into_iter()
            .filter(|m| m.id < *key)
            .max_by_key(|m| m.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{RecurringItem, YearlyItem};
    use crate::storage::JsonConnection;
    use std::fs;
    use tempfile::TempDir;

    fn test_service() -> (MonthService<JsonConnection>, Arc<JsonConnection>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connection = Arc::new(JsonConnection::new(temp_dir.path()).unwrap());
        (MonthService::new(connection.clone()), connection, temp_dir)
    }

    fn month_file(connection: &JsonConnection, key: &MonthKey) -> std::path::PathBuf {
        connection.month_file_path(key)
    }

    #[test]
    fn ensure_with_no_history_creates_an_empty_month() {
        let (service, _conn, _dir) = test_service();
        let key: MonthKey = "2025-01".parse().unwrap();
        let record = service.ensure(&key).unwrap();
        assert_eq!(record, MonthRecord::empty(key));
    }

    #[test]
    fn ensure_is_idempotent_and_does_not_rewrite_unchanged_records() {
        let (service, conn, _dir) = test_service();
        let key: MonthKey = "2025-01".parse().unwrap();

        let first = service.ensure(&key).unwrap();
        let mtime_after_create = fs::metadata(month_file(&conn, &key))
            .unwrap()
            .modified()
            .unwrap();

        let second = service.ensure(&key).unwrap();
        let mtime_after_reread = fs::metadata(month_file(&conn, &key))
            .unwrap()
            .modified()
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(mtime_after_create, mtime_after_reread);
    }

    #[test]
    fn ensure_inherits_across_gaps_from_the_nearest_prior_month() {
        let (service, _conn, _dir) = test_service();
        let jan: MonthKey = "2025-01".parse().unwrap();

        let mut january = service.ensure(&jan).unwrap();
        january.income.base = 50000.0;
        january.recurring_monthly.push(RecurringItem {
            name: "Rent".into(),
            amount: 8000.0,
            created_at: 1,
        });
        january.recurring_yearly.push(YearlyItem {
            name: "Insurance".into(),
            amount: 2400.0,
            due_month: 6,
            created_at: 2,
        });
        service.repository().store_month(&january).unwrap();

        // February and the real December/February gap months were never opened.
        let march = service.ensure(&"2025-03".parse().unwrap()).unwrap();
        assert_eq!(march.income.base, 50000.0);
        assert_eq!(march.recurring_monthly, january.recurring_monthly);
        assert_eq!(march.recurring_yearly, january.recurring_yearly);
        assert!(march.daily.is_empty());
        assert!(march.income.extras.is_empty());
    }

    #[test]
    fn ensure_never_inherits_from_a_later_month() {
        let (service, _conn, _dir) = test_service();
        let mut june = service.ensure(&"2025-06".parse().unwrap()).unwrap();
        june.income.base = 70000.0;
        service.repository().store_month(&june).unwrap();

        let april = service.ensure(&"2025-04".parse().unwrap()).unwrap();
        assert_eq!(april.income.base, 0.0);
        assert!(april.recurring_monthly.is_empty());
    }

    #[test]
    fn ensure_rewrites_legacy_records_once() {
        let (service, conn, _dir) = test_service();
        let key: MonthKey = "2024-07".parse().unwrap();
        let legacy = r#"{"id":"2024-07","income":42000,"monthlyRecurring":[{"name":"Rent","amount":800,"ts":17}]}"#;
        fs::write(month_file(&conn, &key), legacy).unwrap();

        let record = service.ensure(&key).unwrap();
        assert_eq!(record.income.base, 42000.0);
        assert_eq!(record.recurring_monthly[0].created_at, 17);

        // The file is now canonical and a second ensure leaves it alone.
        let rewritten = fs::read_to_string(month_file(&conn, &key)).unwrap();
        assert_ne!(rewritten, legacy);
        let again = service.ensure(&key).unwrap();
        assert_eq!(record, again);
        assert_eq!(
            rewritten,
            fs::read_to_string(month_file(&conn, &key)).unwrap()
        );
    }
}
