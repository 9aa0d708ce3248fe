//! Derived financial figures for one month.

use serde::{Deserialize, Serialize};

use super::month::MonthKey;

/// Everything the dashboard shows for a month, derived deterministically from
/// the month record by the summary service. All monetary fields are computed
/// with minor-unit accumulation; rounding for display is the caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: MonthKey,

    pub base_income: f64,
    pub extra_income: f64,
    pub total_income: f64,

    pub daily_total: f64,
    pub monthly_recurring_total: f64,
    /// Cash actually due this month: yearly items whose due month matches.
    pub yearly_due_this_month: f64,
    /// Monthly recurring plus yearly recurring amortized over twelve months,
    /// regardless of due month. Deliberately distinct from
    /// `yearly_due_this_month`.
    pub effective_monthly_recurring: f64,
    pub total_monthly_expense: f64,

    /// 50/20/20/10 allocation goals. All zero when there is no income.
    pub expense_goal: f64,
    pub invest_goal: f64,
    pub savings_goal: f64,
    pub prepay_goal: f64,

    /// `expense_goal - total_monthly_expense`; negative means overrun.
    pub surplus: f64,
    /// Prepay goal plus any non-negative surplus. Overruns do not eat into
    /// the prepay allocation.
    pub total_prepay_power: f64,
    /// Income minus cash actually going out this month (daily + monthly
    /// recurring + yearly due), on a cash basis rather than amortized.
    pub actual_savings: f64,
}

impl MonthlySummary {
    pub fn is_overrun(&self) -> bool {
        self.surplus < 0.0
    }

    /// Label policy for the surplus figure.
    pub fn surplus_label(&self) -> &'static str {
        if self.is_overrun() {
            "Budget Overrun"
        } else {
            "Expense Surplus"
        }
    }
}
