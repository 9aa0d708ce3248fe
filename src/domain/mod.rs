//! # Domain Module
//!
//! Contains all business logic for the budgeting engine.
//!
//! This module encapsulates the core rules, entities, and services that define
//! how monthly budgets are modeled, inherited, and summarized. It operates
//! independently of any UI framework; storage goes through the traits in
//! `crate::storage`.
//!
//! ## Module Organization
//!
//! - **models**: Month records, list entries, validation, and summary types
//! - **money**: Minor-unit (cent) arithmetic helpers for exact sums
//! - **schema**: Versioned migration of raw stored records to the current shape
//! - **month_service**: Month lifecycle — get-or-create with inheritance
//! - **entry_service**: Income, daily expense, and investment mutations
//! - **recurring_service**: Recurring commitments and forward propagation
//! - **summary_service**: The financial summary calculation
//! - **export_service**: CSV export of the month history
//! - **backup_service**: Full-fidelity JSON backup export and import
//! - **sync_policy**: Data-loss guards for cloud backup decisions
//!
//! ## Business Rules
//!
//! - Months are keyed `YYYY-MM` and materialized lazily on first access
//! - A new month inherits recurring commitments, base income, and investments
//!   from the nearest earlier month; daily expenses and extras start empty
//! - Money sums accumulate in integer cents to stay exact
//! - Recurring changes ripple forward to already-materialized months only
//! - List entries are identified by their creation timestamp, never by index

pub mod backup_service;
pub mod entry_service;
pub mod export_service;
pub mod models;
pub mod money;
pub mod month_service;
pub mod recurring_service;
pub mod schema;
pub mod summary_service;
pub mod sync_policy;

pub use backup_service::*;
pub use entry_service::*;
pub use export_service::*;
pub use month_service::*;
pub use recurring_service::*;
pub use summary_service::*;
pub use sync_policy::*;
