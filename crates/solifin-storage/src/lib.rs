//! SOLIFIN Client Storage
//!
//! SQLite-backed key/value store for the small amount of state the
//! client keeps between runs: the remember-me identifier and the last
//! visited path per principal.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
