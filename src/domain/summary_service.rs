//! Financial summary calculator.
//!
//! Derives the dashboard figures for a month deterministically from its
//! record. All list sums run through minor-unit accumulation; nothing here
//! mutates a record beyond the lazy materialization done by `ensure`.

use anyhow::Result;
use std::sync::Arc;

use crate::domain::models::{MonthKey, MonthRecord, MonthlySummary};
use crate::domain::money;
use crate::domain::month_service::MonthService;
use crate::storage::Connection;

#[derive(Clone)]
pub struct SummaryService<C: Connection> {
    month_service: MonthService<C>,
}

impl<C: Connection> SummaryService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            month_service: MonthService::new(connection),
        }
    }

    /// Derive the full summary for a month, materializing it if needed.
    pub fn summarize(&self, key: &MonthKey) -> Result<MonthlySummary> {
        let record = self.month_service.ensure(key)?;
        Ok(summarize_record(&record))
    }
}

/// The pure calculation, separated from storage so it can be reused on
/// records already in hand (exports, previews).
pub fn summarize_record(record: &MonthRecord) -> MonthlySummary {
    let month = record.id;

    let base_income = record.income.base;
    let extra_income = money::sum_amounts(&record.income.extras, |e| e.amount);
    let total_income = money::round_to_cents(base_income + extra_income);

    let daily_total = money::sum_amounts(&record.daily, |e| e.amount);
    let monthly_recurring_total = money::sum_amounts(&record.recurring_monthly, |i| i.amount);
    let yearly_total = money::sum_amounts(&record.recurring_yearly, |i| i.amount);

    let due: Vec<_> = record
        .recurring_yearly
        .iter()
        .filter(|i| i.due_month == month.month())
        .collect();
    let yearly_due_this_month = money::sum_amounts(&due, |i| i.amount);

    // Amortize yearly costs evenly across the year regardless of due month.
    // Deliberately not rounded here: this feeds further calculations.
    let effective_monthly_recurring = monthly_recurring_total + yearly_total / 12.0;
    let total_monthly_expense = daily_total + effective_monthly_recurring;

    // Allocation goals only make sense against a non-zero income base.
    let has_income = total_income > 0.0;
    let expense_goal = if has_income { total_income * 0.50 } else { 0.0 };
    let invest_goal = if has_income { total_income * 0.20 } else { 0.0 };
    let savings_goal = if has_income { total_income * 0.20 } else { 0.0 };
    let prepay_goal = if has_income { total_income * 0.10 } else { 0.0 };

    let surplus = if has_income {
        expense_goal - total_monthly_expense
    } else {
        0.0
    };

    // Strict policy: an overrun does not eat into the prepay allocation.
    let total_prepay_power = prepay_goal + surplus.max(0.0);

    // Cash basis: what actually left (or will leave) this month.
    let actual_savings =
        total_income - (daily_total + monthly_recurring_total + yearly_due_this_month);

    MonthlySummary {
        month,
        base_income,
        extra_income,
        total_income,
        daily_total,
        monthly_recurring_total,
        yearly_due_this_month,
        effective_monthly_recurring,
        total_monthly_expense,
        expense_goal,
        invest_goal,
        savings_goal,
        prepay_goal,
        surplus,
        total_prepay_power,
        actual_savings,
    }
}
