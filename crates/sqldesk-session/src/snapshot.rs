//! Session snapshot

use std::collections::BTreeMap;
use std::sync::Arc;

use sqldesk_tabs::{resolve_active_tab, tabs_for_connection, Tab};

use crate::persistence::PersistedState;

/// Immutable view of the session: every open tab in display order and the
/// active tab id of each connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub tabs: Vec<Arc<Tab>>,
    pub active_tab_ids: BTreeMap<String, String>,
}

impl SessionSnapshot {
    pub fn active_tab_id(&self, connection_id: &str) -> Option<&str> {
        self.active_tab_ids.get(connection_id).map(String::as_str)
    }

    pub fn active_tab(&self, connection_id: &str) -> Option<Arc<Tab>> {
        resolve_active_tab(
            &self.tabs,
            Some(connection_id),
            self.active_tab_id(connection_id),
        )
    }

    pub fn tabs_for_connection(&self, connection_id: Option<&str>) -> Vec<Arc<Tab>> {
        tabs_for_connection(&self.tabs, connection_id)
    }

    pub fn tab(&self, tab_id: &str) -> Option<&Arc<Tab>> {
        self.tabs.iter().find(|tab| tab.id == tab_id)
    }

    /// Connection ids that currently own tabs, in order of first appearance
    pub fn connections(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for tab in &self.tabs {
            if !seen.contains(&tab.connection_id.as_str()) {
                seen.push(&tab.connection_id);
            }
        }
        seen
    }

    /// Restore the active-pointer invariant on state read from storage.
    ///
    /// Loading flags from an interrupted run are cleared, then pointers are
    /// repaired as in [`Self::repair_active_pointers`].
    pub(crate) fn repaired(mut self) -> Self {
        for tab in self.tabs.iter_mut() {
            if tab.is_loading {
                Arc::make_mut(tab).is_loading = false;
            }
        }
        self.repair_active_pointers();
        self
    }

    /// Pointers of connections without tabs are dropped. Missing, dangling
    /// or foreign pointers fall back to the connection's first tab.
    pub(crate) fn repair_active_pointers(&mut self) {
        let mut active_tab_ids: BTreeMap<String, String> = BTreeMap::new();
        for tab in &self.tabs {
            if active_tab_ids.contains_key(&tab.connection_id) {
                continue;
            }

            let connection = Some(tab.connection_id.as_str());
            let pointer = self
                .active_tab_ids
                .get(&tab.connection_id)
                .filter(|id| {
                    resolve_active_tab(&self.tabs, connection, Some(id.as_str())).is_some()
                })
                .cloned();

            if pointer.is_none() {
                tracing::warn!(
                    connection_id = %tab.connection_id,
                    fallback = %tab.id,
                    "Repaired active tab pointer"
                );
            }

            active_tab_ids.insert(
                tab.connection_id.clone(),
                pointer.unwrap_or_else(|| tab.id.clone()),
            );
        }

        self.active_tab_ids = active_tab_ids;
    }
}

impl From<PersistedState> for SessionSnapshot {
    fn from(state: PersistedState) -> Self {
        Self {
            tabs: state.tabs,
            active_tab_ids: state.active_tab_ids,
        }
        .repaired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqldesk_tabs::{create_initial_tab, TabOverrides};

    fn tab(id: &str, connection_id: &str) -> Arc<Tab> {
        let mut tab = create_initial_tab(Some(connection_id), TabOverrides::console());
        tab.id = id.to_string();
        Arc::new(tab)
    }

    fn pointers(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(conn, id)| (conn.to_string(), id.to_string()))
            .collect()
    }

    #[test]
    fn test_valid_pointers_are_kept() {
        let state = PersistedState {
            tabs: vec![tab("a1", "conn-a"), tab("a2", "conn-a"), tab("b1", "conn-b")],
            active_tab_ids: pointers(&[("conn-a", "a2"), ("conn-b", "b1")]),
        };
        let snapshot = SessionSnapshot::from(state);
        assert_eq!(snapshot.active_tab_id("conn-a"), Some("a2"));
        assert_eq!(snapshot.active_tab_id("conn-b"), Some("b1"));
    }

    #[test]
    fn test_bad_pointers_are_repaired() {
        let state = PersistedState {
            tabs: vec![tab("a1", "conn-a"), tab("a2", "conn-a"), tab("b1", "conn-b")],
            active_tab_ids: pointers(&[
                ("conn-a", "gone"),
                ("conn-b", "a1"),
                ("conn-x", "x1"),
            ]),
        };
        let snapshot = SessionSnapshot::from(state);

        assert_eq!(snapshot.active_tab_id("conn-a"), Some("a1"));
        assert_eq!(snapshot.active_tab_id("conn-b"), Some("b1"));
        assert_eq!(snapshot.active_tab_id("conn-x"), None);
        assert_eq!(snapshot.active_tab_ids.len(), 2);
    }

    #[test]
    fn test_loading_flags_cleared() {
        let mut loading = Tab::clone(&tab("a1", "conn-a"));
        loading.is_loading = true;
        let state = PersistedState {
            tabs: vec![Arc::new(loading)],
            active_tab_ids: BTreeMap::new(),
        };

        let snapshot = SessionSnapshot::from(state);
        assert!(!snapshot.tabs[0].is_loading);
        assert_eq!(snapshot.active_tab_id("conn-a"), Some("a1"));
    }

    #[test]
    fn test_connections_in_display_order() {
        let snapshot = SessionSnapshot {
            tabs: vec![tab("b1", "conn-b"), tab("a1", "conn-a"), tab("b2", "conn-b")],
            active_tab_ids: BTreeMap::new(),
        };
        assert_eq!(snapshot.connections(), vec!["conn-b", "conn-a"]);
    }
}
