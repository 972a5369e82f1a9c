//! Freshness and version policy for cached schema metadata

use chrono::Utc;
use std::sync::Arc;

use crate::types::TableSchema;

/// How long a cache entry stays reusable, in milliseconds
pub const FRESHNESS_WINDOW_MS: i64 = 300_000;

/// Fetched schema metadata stamped with a version tag and fetch time.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaCacheEntry {
    pub(crate) data: Arc<Vec<TableSchema>>,
    pub(crate) version: u32,
    /// Epoch milliseconds
    pub(crate) timestamp: i64,
}

impl SchemaCacheEntry {
    pub fn data(&self) -> &Arc<Vec<TableSchema>> {
        &self.data
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Whether `entry` may be reused instead of fetching again.
///
/// `expected_version` of `None` accepts any version.
pub fn is_cache_usable(entry: Option<&SchemaCacheEntry>, expected_version: Option<u32>) -> bool {
    is_cache_usable_at(entry, expected_version, now_millis())
}

/// [`is_cache_usable`] against an explicit clock reading
pub fn is_cache_usable_at(
    entry: Option<&SchemaCacheEntry>,
    expected_version: Option<u32>,
    now_ms: i64,
) -> bool {
    let Some(entry) = entry else {
        return false;
    };

    let fresh = now_ms - entry.timestamp < FRESHNESS_WINDOW_MS;
    let version_matches = expected_version.map_or(true, |v| v == entry.version);
    fresh && version_matches
}

/// Wrap freshly fetched metadata into a cache entry stamped with now
pub fn stamp_entry(data: Vec<TableSchema>, version: u32) -> SchemaCacheEntry {
    stamp_entry_at(data, version, now_millis())
}

pub(crate) fn stamp_entry_at(
    data: Vec<TableSchema>,
    version: u32,
    now_ms: i64,
) -> SchemaCacheEntry {
    SchemaCacheEntry {
        data: Arc::new(data),
        version,
        timestamp: now_ms,
    }
}
