//! Versioned schema migration for stored month records.
//!
//! Early snapshots of the data went through several shapes: bare-number
//! income, `monthlyRecurring`/`yearlyRecurringDue` list names, `ts` item
//! timestamps. Rather than branching on shape deep in business logic, every
//! record is migrated to the canonical representation exactly once at load.
//! Migration is idempotent; callers re-persist only when the stored form
//! actually differed from canonical.

use serde_json::Value;

use super::models::MonthRecord;

/// Migrate a raw stored value to the canonical `MonthRecord`.
///
/// Returns the record plus whether the stored form differed from its
/// canonical serialization (legacy field names, legacy income shape, missing
/// defaulted fields, or obsolete keys that get dropped on rewrite).
pub fn migrate_month(raw: &Value) -> Result<(MonthRecord, bool), serde_json::Error> {
    let record: MonthRecord = serde_json::from_value(raw.clone())?;
    let canonical = serde_json::to_value(&record)?;
    let migrated = canonical != *raw;
    Ok((record, migrated))
}
