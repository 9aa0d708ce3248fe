//! Storage layer: abstraction traits plus the JSON file backend.

pub mod json;
pub mod traits;

pub use json::{JsonConnection, MonthRepository};
pub use traits::{Connection, LoadedMonth, MonthStorage, StorageError};
