//! Top-level state container
//!
//! Holds the database, the session manager and the schema cache for one
//! running application. Cheap handles to each part are handed out to the
//! command layer.

use std::sync::Arc;

use sqldesk_schema::{SchemaCache, SchemaCacheKey, SchemaFetcher, TableSchema};
use sqldesk_session::{SessionManager, SessionSnapshot};
use sqldesk_storage::Database;

use crate::config::Config;
use crate::Result;

pub struct Workspace {
    config: Config,
    db: Database,
    session_manager: SessionManager,
    schema_cache: SchemaCache,
}

impl Workspace {
    /// Open the database named by `config`, creating it if needed
    pub fn open(config: Config) -> Result<Self> {
        let db = Database::open(&config.database_path)?;
        Ok(Self::with_database(config, db))
    }

    /// Workspace backed by a throwaway in-memory database
    pub fn open_in_memory(config: Config) -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::with_database(config, db))
    }

    fn with_database(config: Config, db: Database) -> Self {
        Self {
            session_manager: SessionManager::new(db.clone()),
            schema_cache: SchemaCache::new(),
            config,
            db,
        }
    }

    /// Restore the previous session, or start empty when restoring is off
    pub fn initialize(&self) -> SessionSnapshot {
        let snapshot = if self.config.restore_session {
            self.session_manager.initialize()
        } else {
            self.session_manager.reset();
            self.session_manager.snapshot()
        };

        tracing::info!(
            database = %self.config.database_path.display(),
            restored = self.config.restore_session,
            tab_count = snapshot.tabs.len(),
            "Workspace ready"
        );

        snapshot
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn session(&self) -> &SessionManager {
        &self.session_manager
    }

    pub fn schema_cache(&self) -> &SchemaCache {
        &self.schema_cache
    }

    /// Schema metadata for `key`, served from cache while it is usable
    pub async fn schema_for<F>(
        &self,
        key: &SchemaCacheKey,
        version: u32,
        fetcher: &F,
    ) -> Result<Arc<Vec<TableSchema>>>
    where
        F: SchemaFetcher + ?Sized,
    {
        Ok(self.schema_cache.get_or_fetch(key, version, fetcher).await?)
    }

    /// Drop everything cached for a removed connection. Its open tabs are
    /// left alone.
    pub fn forget_connection(&self, connection_id: &str) {
        let removed = self.schema_cache.invalidate(connection_id);
        self.session_manager.forget_closed_tabs(connection_id);

        tracing::info!(
            connection_id = %connection_id,
            schema_entries = removed,
            "Forgot connection"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sqldesk_schema::SchemaFetchError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SchemaFetcher for CountingFetcher {
        async fn fetch_schema(
            &self,
            key: &SchemaCacheKey,
        ) -> std::result::Result<Vec<TableSchema>, SchemaFetchError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(vec![TableSchema {
                name: "orders".to_string(),
                schema: key.schema.clone(),
                columns: Vec::new(),
                foreign_keys: Vec::new(),
            }])
        }
    }

    fn config_in(dir: &tempfile::TempDir) -> Config {
        Config::new(dir.path().to_path_buf())
    }

    #[test]
    fn test_session_restored_on_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let workspace = Workspace::open(config_in(&dir)).unwrap();
        workspace.initialize();
        let tab = workspace.session().open_table("conn-1", "orders", None);
        drop(workspace);

        let reopened = Workspace::open(config_in(&dir)).unwrap();
        let snapshot = reopened.initialize();
        assert_eq!(snapshot.tabs.len(), 1);
        assert_eq!(snapshot.active_tab_id("conn-1"), Some(tab.id.as_str()));
    }

    #[test]
    fn test_restore_disabled_starts_empty() {
        let dir = tempfile::tempdir().unwrap();

        let workspace = Workspace::open(config_in(&dir)).unwrap();
        workspace.initialize();
        workspace.session().open_console(Some("conn-1"));
        drop(workspace);

        let config = Config {
            restore_session: false,
            ..config_in(&dir)
        };
        let reopened = Workspace::open(config).unwrap();
        assert!(reopened.initialize().tabs.is_empty());
        assert!(reopened.session().tabs().is_empty());
    }

    #[tokio::test]
    async fn test_schema_for_caches_per_connection() {
        let workspace = Workspace::open_in_memory(Config::default()).unwrap();
        let fetcher = CountingFetcher {
            calls: AtomicUsize::new(0),
        };
        let key = SchemaCacheKey::connection("conn-1");

        let first = workspace.schema_for(&key, 1, &fetcher).await.unwrap();
        workspace.schema_for(&key, 1, &fetcher).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::Relaxed), 1);
        assert_eq!(first[0].name, "orders");

        // Closing every tab leaves the schema cache alone
        workspace.initialize();
        workspace.session().open_console(Some("conn-1"));
        workspace.session().close_all("conn-1");
        assert!(workspace.schema_cache().is_usable(&key, Some(1)));

        workspace.forget_connection("conn-1");
        assert!(workspace.schema_cache().is_empty());
        assert!(workspace.session().restore_last_closed("conn-1").is_none());

        workspace.schema_for(&key, 1, &fetcher).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::Relaxed), 2);
    }
}
