//! Domain model for a month record.
//!
//! A `MonthRecord` holds everything the app knows about one calendar month:
//! income, daily expenses, the month's own copy of recurring items, and
//! investment buckets. Records are keyed by a `MonthKey` (`YYYY-MM`) and every
//! list entry carries a millisecond `created_at` timestamp which is its stable
//! identity within the list — deletion is always by identity, never by index.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Validation failures rejected before any mutation takes place.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid month key: {0}")]
    InvalidMonthKey(String),
    #[error("Amount must be positive")]
    NonPositiveAmount,
    #[error("Amount cannot be negative")]
    NegativeAmount,
    #[error("Label cannot be empty")]
    EmptyLabel,
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("Due month must be between 1 and 12, got {0}")]
    DueMonthOutOfRange(u32),
}

/// Canonical `YYYY-MM` identifier for a month record.
///
/// Keys are zero-padded so their string form sorts lexically in chronological
/// order, which the store and the inheritance resolver both rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::InvalidMonthKey(format!(
                "{}-{}",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    /// The month key a calendar date falls in.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month component, 1-12. Used to match yearly recurring due months.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following calendar month.
    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding calendar month.
    pub fn pred(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidMonthKey(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        MonthKey::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for MonthKey {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// One-off income on top of the monthly base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraIncome {
    pub label: String,
    pub amount: f64,
    /// Stable identity within `income.extras`. Early snapshots stored this as `ts`.
    #[serde(alias = "ts")]
    pub created_at: i64,
}

/// A single daily expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub note: String,
    pub date: NaiveDate,
    #[serde(alias = "ts")]
    pub created_at: i64,
}

/// A bill that repeats every month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringItem {
    pub name: String,
    pub amount: f64,
    #[serde(alias = "ts")]
    pub created_at: i64,
}

/// A bill that falls due once a year, in `due_month`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyItem {
    pub name: String,
    pub amount: f64,
    /// 1-12. Early snapshots stored this as `month`.
    #[serde(alias = "month")]
    pub due_month: u32,
    #[serde(alias = "ts")]
    pub created_at: i64,
}

/// Monthly income: a base salary plus any number of one-off extras.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Income {
    #[serde(default)]
    pub base: f64,
    #[serde(default)]
    pub extras: Vec<ExtraIncome>,
}

/// The full state of one calendar month.
///
/// `recurring_monthly` and `recurring_yearly` are the month's *own copies*,
/// seeded by inheritance when the month is first materialized and mutated
/// independently afterwards. Legacy field names from earlier schema versions
/// are accepted as aliases and rewritten to the canonical names on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthRecord {
    pub id: MonthKey,
    #[serde(default, deserialize_with = "income_compat")]
    pub income: Income,
    #[serde(default)]
    pub daily: Vec<Expense>,
    #[serde(
        default,
        alias = "recurringMonthly",
        alias = "monthlyRecurring"
    )]
    pub recurring_monthly: Vec<RecurringItem>,
    #[serde(
        default,
        alias = "recurringYearly",
        alias = "yearlyRecurringDue"
    )]
    pub recurring_yearly: Vec<YearlyItem>,
    /// Named investment buckets. The legacy fixed `{sip, stocks, other}` shape
    /// loads into the map unchanged.
    #[serde(default)]
    pub investments: BTreeMap<String, f64>,
}

/// Accept the legacy bare-number income shape alongside the structured one.
fn income_compat<'de, D>(deserializer: D) -> Result<Income, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IncomeCompat {
        Flat(f64),
        Split(Income),
    }

    Ok(match IncomeCompat::deserialize(deserializer)? {
        IncomeCompat::Flat(base) => Income {
            base,
            extras: Vec::new(),
        },
        IncomeCompat::Split(income) => income,
    })
}

impl MonthRecord {
    /// A month with no prior history: everything empty or zero.
    pub fn empty(id: MonthKey) -> Self {
        Self {
            id,
            income: Income::default(),
            daily: Vec::new(),
            recurring_monthly: Vec::new(),
            recurring_yearly: Vec::new(),
            investments: BTreeMap::new(),
        }
    }

    /// Seed a new month from the last known truth: recurring obligations,
    /// base income and investment buckets carry forward; daily expenses and
    /// extra income always start empty.
    pub fn inherit_from(id: MonthKey, prior: &Self) -> Self {
        Self {
            id,
            income: Income {
                base: prior.income.base,
                extras: Vec::new(),
            },
            daily: Vec::new(),
            recurring_monthly: prior.recurring_monthly.clone(),
            recurring_yearly: prior.recurring_yearly.clone(),
            investments: prior.investments.clone(),
        }
    }

    /// Pick a `created_at` identity that is unique across every list in this
    /// record, bumping by one millisecond on collision. Two entries added
    /// within the same millisecond must not share an identity.
    pub fn unique_created_at(&self, candidate: i64) -> i64 {
        let mut candidate = candidate;
        while self.contains_created_at(candidate) {
            candidate += 1;
        }
        candidate
    }

    fn contains_created_at(&self, ts: i64) -> bool {
        self.income.extras.iter().any(|e| e.created_at == ts)
            || self.daily.iter().any(|e| e.created_at == ts)
            || self.recurring_monthly.iter().any(|i| i.created_at == ts)
            || self.recurring_yearly.iter().any(|i| i.created_at == ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_key_roundtrips_through_string() {
        let key: MonthKey = "2025-03".parse().unwrap();
        assert_eq!(key.year(), 2025);
        assert_eq!(key.month(), 3);
        assert_eq!(key.to_string(), "2025-03");
    }

    #[test]
    fn month_key_rejects_malformed_input() {
        assert!("2025-13".parse::<MonthKey>().is_err());
        assert!("2025-00".parse::<MonthKey>().is_err());
        assert!("2025-3".parse::<MonthKey>().is_err());
        assert!("garbage".parse::<MonthKey>().is_err());
        assert!("2025/03".parse::<MonthKey>().is_err());
    }

    #[test]
    fn month_key_orders_chronologically() {
        let jan: MonthKey = "2025-01".parse().unwrap();
        let mar: MonthKey = "2025-03".parse().unwrap();
        let dec_prev: MonthKey = "2024-12".parse().unwrap();
        assert!(dec_prev < jan);
        assert!(jan < mar);
    }

    #[test]
    fn month_key_succ_and_pred_wrap_at_year_boundaries() {
        let dec: MonthKey = "2024-12".parse().unwrap();
        assert_eq!(dec.succ().to_string(), "2025-01");
        let jan: MonthKey = "2025-01".parse().unwrap();
        assert_eq!(jan.pred().to_string(), "2024-12");
    }

    #[test]
    fn inherit_copies_recurring_state_but_not_transactions() {
        let jan: MonthKey = "2025-01".parse().unwrap();
        let mut prior = MonthRecord::empty(jan);
        prior.income.base = 50000.0;
        prior.income.extras.push(ExtraIncome {
            label: "Bonus".into(),
            amount: 5000.0,
            created_at: 1,
        });
        prior.daily.push(Expense {
            amount: 100.0,
            category: "Food".into(),
            note: String::new(),
            date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            created_at: 2,
        });
        prior.recurring_monthly.push(RecurringItem {
            name: "Rent".into(),
            amount: 8000.0,
            created_at: 3,
        });
        prior.investments.insert("sip".into(), 2000.0);

        let feb = MonthRecord::inherit_from("2025-02".parse().unwrap(), &prior);
        assert_eq!(feb.income.base, 50000.0);
        assert!(feb.income.extras.is_empty());
        assert!(feb.daily.is_empty());
        assert_eq!(feb.recurring_monthly, prior.recurring_monthly);
        assert_eq!(feb.investments.get("sip"), Some(&2000.0));
    }

    #[test]
    fn unique_created_at_bumps_on_collision() {
        let mut record = MonthRecord::empty("2025-01".parse().unwrap());
        record.daily.push(Expense {
            amount: 10.0,
            category: "Food".into(),
            note: String::new(),
            date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            created_at: 100,
        });
        record.recurring_monthly.push(RecurringItem {
            name: "Rent".into(),
            amount: 8000.0,
            created_at: 101,
        });
        assert_eq!(record.unique_created_at(100), 102);
        assert_eq!(record.unique_created_at(99), 99);
    }

    #[test]
    fn legacy_income_number_deserializes_into_structured_shape() {
        let json = r#"{"id":"2024-07","income":42000}"#;
        let record: MonthRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.income.base, 42000.0);
        assert!(record.income.extras.is_empty());
    }

    #[test]
    fn legacy_field_names_are_accepted_as_aliases() {
        let json = r#"{
            "id": "2024-07",
            "income": {"base": 1000, "extras": []},
            "recurringMonthly": [{"name": "Rent", "amount": 800, "ts": 17}],
            "recurringYearly": [{"name": "Insurance", "amount": 1200, "month": 6, "ts": 18}]
        }"#;
        let record: MonthRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.recurring_monthly[0].created_at, 17);
        assert_eq!(record.recurring_yearly[0].due_month, 6);
    }
}
