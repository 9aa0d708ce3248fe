//! Domain models shared across services.

pub mod month;
pub mod summary;

pub use month::{
    Expense, ExtraIncome, Income, MonthKey, MonthRecord, RecurringItem, ValidationError,
    YearlyItem,
};
pub use summary::MonthlySummary;
