//! SQLDesk Storage Layer
//!
//! SQLite-backed key-value substrate for editor state.
//! Each key holds one opaque text blob; writes replace the whole value.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
