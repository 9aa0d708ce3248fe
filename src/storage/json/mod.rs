//! JSON file storage backend.

pub mod connection;
pub mod month_repository;

pub use connection::JsonConnection;
pub use month_repository::MonthRepository;
