//! Recurring item service: add/delete plus forward propagation.
//!
//! A recurring change made in month M ripples to every *already existing*
//! month after M, so materialized future months stay consistent with the
//! present. Past months are history and are never touched; months not yet
//! materialized need no ripple — they inherit the origin's current state when
//! first ensured. Propagation is best-effort per month, not transactional:
//! a failure in one future month does not roll back the others.

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;

use crate::domain::models::{MonthKey, MonthRecord, RecurringItem, ValidationError, YearlyItem};
use crate::domain::month_service::MonthService;
use crate::storage::{Connection, MonthStorage, StorageError};

/// How often a recurring item falls due.
#[derive(Debug, Clone, PartialEq)]
pub enum Frequency {
    Monthly,
    Yearly { due_month: u32 },
}

#[derive(Debug, Clone)]
pub struct AddRecurringCommand {
    pub name: String,
    pub amount: f64,
    pub frequency: Frequency,
}

/// Which of the two recurring lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurringKind {
    Monthly,
    Yearly,
}

/// A recurring item together with the list it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum RecurringEntry {
    Monthly(RecurringItem),
    Yearly(YearlyItem),
}

impl RecurringEntry {
    pub fn created_at(&self) -> i64 {
        match self {
            RecurringEntry::Monthly(item) => item.created_at,
            RecurringEntry::Yearly(item) => item.created_at,
        }
    }

    pub fn kind(&self) -> RecurringKind {
        match self {
            RecurringEntry::Monthly(_) => RecurringKind::Monthly,
            RecurringEntry::Yearly(_) => RecurringKind::Yearly,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RecurringEntry::Monthly(item) => &item.name,
            RecurringEntry::Yearly(item) => &item.name,
        }
    }
}

/// The change to ripple forward.
#[derive(Debug, Clone)]
pub enum PropagationAction {
    Add(RecurringEntry),
    Delete {
        kind: RecurringKind,
        created_at: i64,
    },
}

/// Partial propagation failure: the change reached `applied` but not
/// `failed`. Already-applied updates stand; nothing is retried automatically.
#[derive(Debug, thiserror::Error)]
#[error("Recurring change failed for {} future month(s)", .failed.len())]
pub struct PropagationError {
    pub applied: Vec<MonthKey>,
    pub failed: Vec<(MonthKey, StorageError)>,
    /// For an add: the entry that was created and persisted in the origin
    /// month before propagation broke down. Its `created_at` identity is
    /// what the caller needs to later delete or retry the change.
    pub entry: Option<RecurringEntry>,
}

#[derive(Clone)]
pub struct RecurringService<C: Connection> {
    month_service: MonthService<C>,
    month_repository: C::MonthRepository,
}

impl<C: Connection> RecurringService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        let month_repository = connection.create_month_repository();
        let month_service = MonthService::new(connection);
        Self {
            month_service,
            month_repository,
        }
    }

    /// Add a recurring item to `origin` and ripple it into every existing
    /// later month. Returns the created entry; its `created_at` is the
    /// identity to use for later deletion.
    ///
    /// If the origin month persisted but some future month failed, the error
    /// is a `PropagationError` and the successful updates stand.
    pub fn add_recurring(
        &self,
        origin: &MonthKey,
        command: AddRecurringCommand,
    ) -> Result<RecurringEntry> {
        if command.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if command.amount <= 0.0 {
            return Err(ValidationError::NonPositiveAmount.into());
        }
        if let Frequency::Yearly { due_month } = command.frequency {
            if !(1..=12).contains(&due_month) {
                return Err(ValidationError::DueMonthOutOfRange(due_month).into());
            }
        }

        let mut record = self.month_service.ensure(origin)?;
        let created_at = record.unique_created_at(Utc::now().timestamp_millis());
        let entry = match command.frequency {
            Frequency::Monthly => RecurringEntry::Monthly(RecurringItem {
                name: command.name,
                amount: command.amount,
                created_at,
            }),
            Frequency::Yearly { due_month } => RecurringEntry::Yearly(YearlyItem {
                name: command.name,
                amount: command.amount,
                due_month,
                created_at,
            }),
        };

        apply_add(&mut record, &entry);
        self.month_repository.store_month(&record)?;
        info!("Added recurring item '{}' to {}", entry.name(), origin);

        if let Err(e) = self.propagate(origin, &PropagationAction::Add(entry.clone())) {
            // The origin write stands; hand the created entry back with the
            // error so its identity stays addressable.
            return Err(match e.downcast::<PropagationError>() {
                Ok(mut partial) => {
                    partial.entry = Some(entry);
                    partial.into()
                }
                Err(other) => other,
            });
        }
        Ok(entry)
    }

    /// Delete a recurring item from `origin` by identity and ripple the
    /// removal into every existing later month. A miss in the origin month is
    /// a no-op (`Ok(false)`), matching upsert-style tolerance.
    pub fn delete_recurring(
        &self,
        origin: &MonthKey,
        kind: RecurringKind,
        created_at: i64,
    ) -> Result<bool> {
        let mut record = self.month_service.ensure(origin)?;
        if !apply_delete(&mut record, kind, created_at) {
            warn!(
                "No {:?} recurring item with identity {} in {}",
                kind, created_at, origin
            );
            return Ok(false);
        }
        self.month_repository.store_month(&record)?;
        info!("Deleted recurring item {} from {}", created_at, origin);

        self.propagate(origin, &PropagationAction::Delete { kind, created_at })?;
        Ok(true)
    }

    /// Ripple a recurring change to all existing months after `origin`.
    ///
    /// Does not create months and never touches `origin` or anything before
    /// it. Idempotent: re-adding an identity a month already holds is a skip,
    /// not a duplicate. Returns the months actually updated.
    pub fn propagate(
        &self,
        origin: &MonthKey,
        action: &PropagationAction,
    ) -> Result<Vec<MonthKey>> {
        let mut futures: Vec<MonthRecord> = self
            .month_repository
            .list_months()?
            .into_iter()
            .filter(|m| m.id > *origin)
            .collect();
        futures.sort_by_key(|m| m.id);

        let mut applied = Vec::new();
        let mut failed = Vec::new();
        for mut record in futures {
            let changed = match action {
                PropagationAction::Add(entry) => {
                    if contains_identity(&record, entry.kind(), entry.created_at()) {
                        false
                    } else {
                        apply_add(&mut record, entry);
                        true
                    }
                }
                PropagationAction::Delete { kind, created_at } => {
                    apply_delete(&mut record, *kind, *created_at)
                }
            };
            if !changed {
                continue;
            }
            let key = record.id;
            match self.month_repository.store_month(&record) {
                Ok(()) => applied.push(key),
                Err(e) => {
                    warn!("Propagation to {} failed: {}", key, e);
                    failed.push((key, e));
                }
            }
        }

        if failed.is_empty() {
            Ok(applied)
        } else {
            Err(PropagationError {
                applied,
                failed,
                entry: None,
            }
            .into())
        }
    }
}

fn apply_add(record: &mut MonthRecord, entry: &RecurringEntry) {
    match entry {
        RecurringEntry::Monthly(item) => record.recurring_monthly.push(item.clone()),
        RecurringEntry::Yearly(item) => record.recurring_yearly.push(item.clone()),
    }
}

fn apply_delete(record: &mut MonthRecord, kind: RecurringKind, created_at: i64) -> bool {
    match kind {
        RecurringKind::Monthly => {
            let before = record.recurring_monthly.len();
            record
                .recurring_monthly
                .retain(|i| i.created_at != created_at);
            record.recurring_monthly.len() != before
        }
        RecurringKind::Yearly => {
            let before = record.recurring_yearly.len();
            record
                .recurring_yearly
                .retain(|i| i.created_at != created_at);
            record.recurring_yearly.len() != before
        }
    }
}

fn contains_identity(record: &MonthRecord, kind: RecurringKind, created_at: i64) -> bool {
    match kind {
        RecurringKind::Monthly => record
            .recurring_monthly
            .iter()
            .any(|i| i.created_at == created_at),
        RecurringKind::Yearly => record
            .recurring_yearly
            .iter()
            .any(|i| i.created_at == created_at),
    }
}
