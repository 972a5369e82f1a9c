//! Keyed schema cache
//!
//! Entries are keyed by connection and, for backends with named schemas,
//! the schema name: together they determine the table list returned by one
//! fetch round trip.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{SchemaError, SchemaFetchError};
use crate::policy::{is_cache_usable, stamp_entry, SchemaCacheEntry};
use crate::types::TableSchema;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaCacheKey {
    pub connection_id: String,
    pub schema: Option<String>,
}

impl SchemaCacheKey {
    pub fn connection(connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            schema: None,
        }
    }

    pub fn with_schema(connection_id: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            schema: Some(schema.into()),
        }
    }
}

/// Backend that introspects a connection's tables
#[async_trait]
pub trait SchemaFetcher: Send + Sync {
    async fn fetch_schema(
        &self,
        key: &SchemaCacheKey,
    ) -> std::result::Result<Vec<TableSchema>, SchemaFetchError>;
}

pub struct SchemaCache {
    entries: Arc<RwLock<HashMap<SchemaCacheKey, SchemaCacheEntry>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn get(&self, key: &SchemaCacheKey) -> Option<SchemaCacheEntry> {
        self.entries.read().get(key).cloned()
    }

    /// Stamp `data` and store it, replacing any previous entry
    pub fn insert(
        &self,
        key: SchemaCacheKey,
        data: Vec<TableSchema>,
        version: u32,
    ) -> SchemaCacheEntry {
        let entry = stamp_entry(data, version);
        self.insert_entry(key, entry.clone());
        entry
    }

    pub fn insert_entry(&self, key: SchemaCacheKey, entry: SchemaCacheEntry) {
        self.entries.write().insert(key, entry);
    }

    /// Whether the entry for `key` may be reused at `version`
    pub fn is_usable(&self, key: &SchemaCacheKey, version: Option<u32>) -> bool {
        is_cache_usable(self.entries.read().get(key), version)
    }

    /// Return cached tables for `key`, fetching only when the cached entry
    /// is missing, stale or of another version.
    pub async fn get_or_fetch<F>(
        &self,
        key: &SchemaCacheKey,
        version: u32,
        fetcher: &F,
    ) -> Result<Arc<Vec<TableSchema>>>
    where
        F: SchemaFetcher + ?Sized,
    {
        if let Some(entry) = self.entries.read().get(key) {
            if is_cache_usable(Some(entry), Some(version)) {
                tracing::debug!(
                    connection_id = %key.connection_id,
                    schema = ?key.schema,
                    "Schema cache hit"
                );
                return Ok(Arc::clone(entry.data()));
            }
        }

        tracing::debug!(
            connection_id = %key.connection_id,
            schema = ?key.schema,
            version,
            "Schema cache miss, fetching"
        );

        let tables = fetcher
            .fetch_schema(key)
            .await
            .map_err(|source| SchemaError::Fetch {
                connection_id: key.connection_id.clone(),
                source,
            })?;

        let entry = self.insert(key.clone(), tables, version);
        Ok(Arc::clone(entry.data()))
    }

    /// Drop every entry belonging to `connection_id`. Returns how many.
    pub fn invalidate(&self, connection_id: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| key.connection_id != connection_id);
        let removed = before - entries.len();

        if removed > 0 {
            tracing::debug!(
                connection_id = %connection_id,
                removed,
                "Invalidated schema cache"
            );
        }
        removed
    }

    pub fn invalidate_all(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SchemaCache {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::policy::{now_millis, stamp_entry_at, FRESHNESS_WINDOW_MS};

    struct FakeFetcher {
        fetch_count: AtomicUsize,
        fail: bool,
    }

    impl FakeFetcher {
        fn new() -> Self {
            Self {
                fetch_count: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fetch_count: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn count(&self) -> usize {
            self.fetch_count.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl SchemaFetcher for FakeFetcher {
        async fn fetch_schema(
            &self,
            key: &SchemaCacheKey,
        ) -> std::result::Result<Vec<TableSchema>, SchemaFetchError> {
            self.fetch_count.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                return Err(SchemaFetchError::new("connection refused"));
            }
            Ok(vec![TableSchema {
                name: format!("{}_users", key.connection_id),
                schema: key.schema.clone(),
                columns: Vec::new(),
                foreign_keys: Vec::new(),
            }])
        }
    }

    #[tokio::test]
    async fn test_second_read_uses_cache() {
        let cache = SchemaCache::new();
        let fetcher = FakeFetcher::new();
        let key = SchemaCacheKey::connection("conn-1");

        let first = cache.get_or_fetch(&key, 1, &fetcher).await.unwrap();
        let second = cache.get_or_fetch(&key, 1, &fetcher).await.unwrap();

        assert_eq!(fetcher.count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first[0].name, "conn-1_users");
    }

    #[tokio::test]
    async fn test_version_change_refetches() {
        let cache = SchemaCache::new();
        let fetcher = FakeFetcher::new();
        let key = SchemaCacheKey::connection("conn-1");

        cache.get_or_fetch(&key, 1, &fetcher).await.unwrap();
        cache.get_or_fetch(&key, 2, &fetcher).await.unwrap();

        assert_eq!(fetcher.count(), 2);
        assert_eq!(cache.get(&key).unwrap().version(), 2);
    }

    #[tokio::test]
    async fn test_stale_entry_refetches() {
        let cache = SchemaCache::new();
        let fetcher = FakeFetcher::new();
        let key = SchemaCacheKey::connection("conn-1");

        let stale = stamp_entry_at(Vec::new(), 1, now_millis() - FRESHNESS_WINDOW_MS - 1_000);
        cache.insert_entry(key.clone(), stale);
        assert!(!cache.is_usable(&key, Some(1)));

        let tables = cache.get_or_fetch(&key, 1, &fetcher).await.unwrap();
        assert_eq!(fetcher.count(), 1);
        assert_eq!(tables.len(), 1);
        assert!(cache.is_usable(&key, Some(1)));
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_cache_untouched() {
        let cache = SchemaCache::new();
        let fetcher = FakeFetcher::failing();
        let key = SchemaCacheKey::connection("conn-1");

        let err = cache.get_or_fetch(&key, 1, &fetcher).await.unwrap_err();
        let SchemaError::Fetch { connection_id, .. } = err;
        assert_eq!(connection_id, "conn-1");
        assert!(cache.get(&key).is_none());
    }

    #[tokio::test]
    async fn test_named_schemas_are_separate_entries() {
        let cache = SchemaCache::new();
        let fetcher = FakeFetcher::new();

        let public = SchemaCacheKey::with_schema("conn-1", "public");
        let audit = SchemaCacheKey::with_schema("conn-1", "audit");
        cache.get_or_fetch(&public, 1, &fetcher).await.unwrap();
        let audit_tables = cache.get_or_fetch(&audit, 1, &fetcher).await.unwrap();

        assert_eq!(fetcher.count(), 2);
        assert_eq!(audit_tables[0].schema.as_deref(), Some("audit"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_invalidate_connection() {
        let cache = SchemaCache::new();
        cache.insert(SchemaCacheKey::connection("conn-1"), Vec::new(), 1);
        cache.insert(SchemaCacheKey::with_schema("conn-1", "audit"), Vec::new(), 1);
        cache.insert(SchemaCacheKey::connection("conn-2"), Vec::new(), 1);

        assert_eq!(cache.invalidate("conn-1"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&SchemaCacheKey::connection("conn-2")).is_some());

        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
