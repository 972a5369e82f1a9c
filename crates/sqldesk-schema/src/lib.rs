//! SQLDesk Schema Cache
//!
//! Decides whether schema metadata fetched earlier may be reused.
//! An entry is reusable for five minutes and only while its version tag
//! matches what the caller expects. Entries are always complete: they are
//! built in one step by [`stamp_entry`] and replaced, never edited.

mod cache;
mod error;
mod policy;
mod types;

pub use cache::{SchemaCache, SchemaCacheKey, SchemaFetcher};
pub use error::{SchemaError, SchemaFetchError};
pub use policy::{
    is_cache_usable, is_cache_usable_at, now_millis, stamp_entry, SchemaCacheEntry,
    FRESHNESS_WINDOW_MS,
};
pub use types::{ColumnSchema, ForeignKeySchema, TableSchema};

pub type Result<T> = std::result::Result<T, SchemaError>;
