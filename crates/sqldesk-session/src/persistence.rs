//! Session persistence
//!
//! The session is stored as one JSON blob under a fixed key:
//! `{ "tabs": [...], "activeTabIds": { "<connection>": "<tab>" } }`.
//! Loading never fails: a missing, unreadable or malformed blob yields
//! `None`. Saving is best-effort and only logs failures.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use sqldesk_storage::Database;
use sqldesk_tabs::Tab;

pub const SESSION_STATE_KEY: &str = "session.tabs";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tabs: Vec<Arc<Tab>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active_tab_ids: BTreeMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedStateRef<'a> {
    tabs: &'a [Arc<Tab>],
    active_tab_ids: &'a BTreeMap<String, String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub struct SessionStore {
    db: Database,
}

impl SessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn load(&self) -> Option<PersistedState> {
        let raw = match self.db.get_setting(SESSION_STATE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session state");
                return None;
            }
        };

        match serde_json::from_str::<PersistedState>(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed session state");
                None
            }
        }
    }

    pub fn save(&self, tabs: &[Arc<Tab>], active_tab_ids: &BTreeMap<String, String>) {
        let state = PersistedStateRef {
            tabs,
            active_tab_ids,
        };

        let json = match serde_json::to_string(&state) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize session state");
                return;
            }
        };

        if let Err(e) = self.db.set_setting(SESSION_STATE_KEY, &json) {
            tracing::warn!(error = %e, "Failed to save session state");
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.db.delete_setting(SESSION_STATE_KEY) {
            tracing::warn!(error = %e, "Failed to clear session state");
        }
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqldesk_tabs::{create_initial_tab, TabOverrides};

    fn store() -> (Database, SessionStore) {
        let db = Database::open_in_memory().unwrap();
        let store = SessionStore::new(db.clone());
        (db, store)
    }

    #[test]
    fn test_missing_state_loads_none() {
        let (_, store) = store();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let (_, store) = store();
        let tab = Arc::new(create_initial_tab(
            Some("conn-1"),
            TabOverrides::table("users", Some("id".to_string())),
        ));
        let mut active = BTreeMap::new();
        active.insert("conn-1".to_string(), tab.id.clone());

        store.save(&[Arc::clone(&tab)], &active);

        let loaded = store.load().unwrap();
        assert_eq!(loaded.tabs.len(), 1);
        assert_eq!(*loaded.tabs[0], *tab);
        assert_eq!(loaded.active_tab_ids, active);
    }

    #[test]
    fn test_wire_format_field_names() {
        let (db, store) = store();
        let tab = Arc::new(create_initial_tab(Some("conn-1"), TabOverrides::console()));
        let mut active = BTreeMap::new();
        active.insert("conn-1".to_string(), tab.id.clone());
        store.save(&[tab], &active);

        let raw = db.get_setting(SESSION_STATE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["tabs"].is_array());
        assert!(value["activeTabIds"]["conn-1"].is_string());
        assert_eq!(value["tabs"][0]["isEditorOpen"], true);
    }

    #[test]
    fn test_malformed_state_loads_none() {
        let (db, store) = store();
        for raw in ["{not json", "[1,2,3]", "null", "{\"tabs\": [{\"title\": 5}]}"] {
            db.set_setting(SESSION_STATE_KEY, raw).unwrap();
            assert!(store.load().is_none(), "payload {raw} should be rejected");
        }
    }

    #[test]
    fn test_partial_state_is_normalized() {
        let (db, store) = store();

        db.set_setting(SESSION_STATE_KEY, "{}").unwrap();
        assert_eq!(store.load().unwrap(), PersistedState::default());

        db.set_setting(SESSION_STATE_KEY, "{\"tabs\": null, \"activeTabIds\": null}")
            .unwrap();
        assert_eq!(store.load().unwrap(), PersistedState::default());

        db.set_setting(
            SESSION_STATE_KEY,
            "{\"tabs\": [{\"id\": \"abc1234\", \"connectionId\": \"c\"}]}",
        )
        .unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.tabs.len(), 1);
        assert!(loaded.active_tab_ids.is_empty());
    }

    #[test]
    fn test_clear() {
        let (_, store) = store();
        store.save(&[], &BTreeMap::new());
        assert!(store.load().is_some());

        store.clear();
        assert!(store.load().is_none());
    }
}
