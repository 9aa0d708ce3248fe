//! Entry service: the mutation surface for income, daily expenses and
//! investment buckets.
//!
//! Every operation validates before touching any state, mutates the month
//! record in memory, and persists it synchronously; callers must not assume
//! the change stuck unless the call returned `Ok`. Deletions are by
//! `created_at` identity — never by list position.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use log::info;
use std::sync::Arc;

use crate::domain::models::{Expense, ExtraIncome, MonthKey, ValidationError};
use crate::domain::month_service::MonthService;
use crate::storage::{Connection, MonthStorage};

#[derive(Debug, Clone)]
pub struct AddExpenseCommand {
    pub amount: f64,
    pub category: String,
    pub note: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct AddExtraIncomeCommand {
    pub label: String,
    pub amount: f64,
}

#[derive(Clone)]
pub struct EntryService<C: Connection> {
    month_service: MonthService<C>,
    month_repository: C::MonthRepository,
}

impl<C: Connection> EntryService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        let month_repository = connection.create_month_repository();
        let month_service = MonthService::new(connection);
        Self {
            month_service,
            month_repository,
        }
    }

    /// Set the base income for a month. Zero is allowed (clearing the field),
    /// negative is not.
    pub fn set_base_income(&self, key: &MonthKey, amount: f64) -> Result<()> {
        if amount < 0.0 {
            return Err(ValidationError::NegativeAmount.into());
        }
        let mut record = self.month_service.ensure(key)?;
        record.income.base = amount;
        self.month_repository.store_month(&record)?;
        info!("Set base income for {} to {:.2}", key, amount);
        Ok(())
    }

    pub fn add_extra_income(
        &self,
        key: &MonthKey,
        command: AddExtraIncomeCommand,
    ) -> Result<ExtraIncome> {
        if command.label.trim().is_empty() {
            return Err(ValidationError::EmptyLabel.into());
        }
        if command.amount <= 0.0 {
            return Err(ValidationError::NonPositiveAmount.into());
        }

        let mut record = self.month_service.ensure(key)?;
        let extra = ExtraIncome {
            label: command.label,
            amount: command.amount,
            created_at: record.unique_created_at(Utc::now().timestamp_millis()),
        };
        record.income.extras.push(extra.clone());
        self.month_repository.store_month(&record)?;
        info!("Added extra income '{}' to {}", extra.label, key);
        Ok(extra)
    }

    /// Remove an extra income by identity. Returns whether anything matched.
    pub fn delete_extra_income(&self, key: &MonthKey, created_at: i64) -> Result<bool> {
        let mut record = self.month_service.ensure(key)?;
        let before = record.income.extras.len();
        record.income.extras.retain(|e| e.created_at != created_at);
        if record.income.extras.len() == before {
            return Ok(false);
        }
        self.month_repository.store_month(&record)?;
        Ok(true)
    }

    /// Record a daily expense. The expense lands in the month its *date*
    /// falls in, which is not necessarily the month currently being viewed.
    pub fn add_expense(&self, command: AddExpenseCommand) -> Result<Expense> {
        if command.amount <= 0.0 {
            return Err(ValidationError::NonPositiveAmount.into());
        }

        let key = MonthKey::from_date(command.date);
        let mut record = self.month_service.ensure(&key)?;
        let expense = Expense {
            amount: command.amount,
            category: command.category,
            note: command.note,
            date: command.date,
            created_at: record.unique_created_at(Utc::now().timestamp_millis()),
        };
        record.daily.push(expense.clone());
        self.month_repository.store_month(&record)?;
        info!(
            "Added expense of {:.2} ({}) to {}",
            expense.amount, expense.category, key
        );
        Ok(expense)
    }

    /// Remove a daily expense by identity. Returns whether anything matched.
    pub fn delete_expense(&self, key: &MonthKey, created_at: i64) -> Result<bool> {
        let mut record = self.month_service.ensure(key)?;
        let before = record.daily.len();
        record.daily.retain(|e| e.created_at != created_at);
        if record.daily.len() == before {
            return Ok(false);
        }
        self.month_repository.store_month(&record)?;
        info!("Deleted expense {} from {}", created_at, key);
        Ok(true)
    }

    /// Upsert a named investment bucket. A zero amount removes the bucket;
    /// negative amounts are rejected.
    pub fn set_investment(&self, key: &MonthKey, bucket: &str, amount: f64) -> Result<()> {
        if bucket.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if amount < 0.0 {
            return Err(ValidationError::NegativeAmount.into());
        }

        let mut record = self.month_service.ensure(key)?;
        if amount == 0.0 {
            record.investments.remove(bucket);
        } else {
            record.investments.insert(bucket.to_string(), amount);
        }
        self.month_repository.store_month(&record)?;
        Ok(())
    }
}
