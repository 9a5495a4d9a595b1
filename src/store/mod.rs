//! SQLite plumbing shared by the registry and the workflow engine.

pub mod database;
pub mod error;
mod schema;

pub use database::{begin_write, date_from_db, date_to_db, Database};
pub use error::{is_busy, unique_violation, StoreError};
