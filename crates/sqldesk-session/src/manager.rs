//! Session Manager
//!
//! Owns the current session snapshot. Each action reads the snapshot, runs
//! exactly one tab store operation, swaps in the result and saves it.
//! All writers go through one lock, so actions never interleave.

use parking_lot::RwLock;
use std::sync::Arc;

use sqldesk_storage::Database;
use sqldesk_tabs::{
    close_all_for_connection, close_others_for_connection, close_single, close_to_left,
    close_to_right, create_initial_tab, find_existing_table_tab, generate_tab_id,
    generate_title, move_tab, patch_tab, resolve_active_tab, CloseOutcome, Tab, TabOverrides,
    TabPatch,
};

use crate::error::SessionError;
use crate::persistence::SessionStore;
use crate::snapshot::SessionSnapshot;
use crate::Result;

/// How many closed tabs are remembered for restore
pub const MAX_RECENTLY_CLOSED: usize = 20;

#[derive(Debug, Clone)]
struct ClosedTab {
    tab: Arc<Tab>,
    /// Position in the global tab list when it was closed
    index: usize,
}

pub struct SessionManager {
    /// Current snapshot
    state: Arc<RwLock<SessionSnapshot>>,
    /// Durable copy of the snapshot
    store: SessionStore,
    recently_closed: Arc<RwLock<Vec<ClosedTab>>>,
}

fn replacement_tab(connection_id: &str) -> Tab {
    create_initial_tab(Some(connection_id), TabOverrides::console())
}

impl SessionManager {
    pub fn new(db: Database) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionSnapshot::default())),
            store: SessionStore::new(db),
            recently_closed: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Load the saved session, repairing active pointers if needed.
    /// Starts empty when nothing usable is stored.
    pub fn initialize(&self) -> SessionSnapshot {
        let snapshot = self
            .store
            .load()
            .map(SessionSnapshot::from)
            .unwrap_or_default();

        *self.state.write() = snapshot.clone();

        tracing::info!(
            tab_count = snapshot.tabs.len(),
            connection_count = snapshot.active_tab_ids.len(),
            "Initialized session"
        );

        snapshot
    }

    /// Drop the saved session and start over with no tabs
    pub fn reset(&self) {
        *self.state.write() = SessionSnapshot::default();
        self.recently_closed.write().clear();
        self.store.clear();
        tracing::info!("Reset session");
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.read().clone()
    }

    pub fn tabs(&self) -> Vec<Arc<Tab>> {
        self.state.read().tabs.clone()
    }

    pub fn tabs_for_connection(&self, connection_id: Option<&str>) -> Vec<Arc<Tab>> {
        self.state.read().tabs_for_connection(connection_id)
    }

    pub fn active_tab(&self, connection_id: &str) -> Option<Arc<Tab>> {
        self.state.read().active_tab(connection_id)
    }

    pub fn get_tab(&self, tab_id: &str) -> Option<Arc<Tab>> {
        self.state.read().tab(tab_id).cloned()
    }

    // === Opening ===

    pub fn open_console(&self, connection_id: Option<&str>) -> Arc<Tab> {
        self.open_tab(connection_id, TabOverrides::console())
    }

    pub fn open_query_builder(&self, connection_id: Option<&str>) -> Arc<Tab> {
        self.open_tab(connection_id, TabOverrides::query_builder())
    }

    /// Open a browser for `table_name`, or focus the one already open
    pub fn open_table(
        &self,
        connection_id: &str,
        table_name: &str,
        pk_column: Option<String>,
    ) -> Arc<Tab> {
        let mut state = self.state.write();

        let existing = find_existing_table_tab(&state.tabs, connection_id, Some(table_name));
        if let Some(existing) = existing {
            state
                .active_tab_ids
                .insert(connection_id.to_string(), existing.id.clone());
            self.persist(&state);

            tracing::debug!(
                connection_id = %connection_id,
                tab_id = %existing.id,
                table = %table_name,
                "Reused table tab"
            );
            return existing;
        }

        let overrides = TabOverrides::table(table_name, pk_column);
        self.push_new_tab(&mut state, connection_id, overrides)
    }

    /// Open a new tab built from `overrides` and make it active
    pub fn open_tab(&self, connection_id: Option<&str>, overrides: TabOverrides) -> Arc<Tab> {
        let mut state = self.state.write();
        self.push_new_tab(&mut state, connection_id.unwrap_or_default(), overrides)
    }

    fn push_new_tab(
        &self,
        state: &mut SessionSnapshot,
        connection_id: &str,
        mut overrides: TabOverrides,
    ) -> Arc<Tab> {
        overrides.title = Some(generate_title(&state.tabs, connection_id, &overrides));
        let tab = Arc::new(create_initial_tab(Some(connection_id), overrides));

        state.tabs.push(Arc::clone(&tab));
        state
            .active_tab_ids
            .insert(connection_id.to_string(), tab.id.clone());
        self.persist(state);

        tracing::info!(
            connection_id = %connection_id,
            tab_id = %tab.id,
            kind = %tab.kind,
            title = %tab.title,
            "Opened tab"
        );

        tab
    }

    // === Selection ===

    pub fn switch_active(&self, connection_id: &str, tab_id: &str) -> Result<Arc<Tab>> {
        let mut state = self.state.write();

        let tab = resolve_active_tab(&state.tabs, Some(connection_id), Some(tab_id)).ok_or_else(
            || SessionError::TabNotFound {
                connection_id: connection_id.to_string(),
                tab_id: tab_id.to_string(),
            },
        )?;

        state
            .active_tab_ids
            .insert(connection_id.to_string(), tab.id.clone());
        self.persist(&state);

        tracing::debug!(connection_id = %connection_id, tab_id = %tab_id, "Switched active tab");

        Ok(tab)
    }

    // === Closing ===

    pub fn close_tab(&self, connection_id: &str, tab_id: &str) -> CloseOutcome {
        self.apply_close(connection_id, |state| {
            close_single(
                &state.tabs,
                connection_id,
                tab_id,
                state.active_tab_id(connection_id),
                replacement_tab,
            )
        })
    }

    pub fn close_all(&self, connection_id: &str) -> CloseOutcome {
        self.apply_close(connection_id, |state| {
            close_all_for_connection(&state.tabs, connection_id, replacement_tab)
        })
    }

    pub fn close_others(&self, connection_id: &str, keep_id: &str) -> CloseOutcome {
        self.apply_close(connection_id, |state| {
            close_others_for_connection(
                &state.tabs,
                connection_id,
                keep_id,
                state.active_tab_id(connection_id),
            )
        })
    }

    pub fn close_to_left(&self, connection_id: &str, target_id: &str) -> CloseOutcome {
        self.apply_close(connection_id, |state| {
            close_to_left(
                &state.tabs,
                connection_id,
                target_id,
                state.active_tab_id(connection_id),
            )
        })
    }

    pub fn close_to_right(&self, connection_id: &str, target_id: &str) -> CloseOutcome {
        self.apply_close(connection_id, |state| {
            close_to_right(
                &state.tabs,
                connection_id,
                target_id,
                state.active_tab_id(connection_id),
            )
        })
    }

    fn apply_close<F>(&self, connection_id: &str, op: F) -> CloseOutcome
    where
        F: FnOnce(&SessionSnapshot) -> CloseOutcome,
    {
        let mut state = self.state.write();
        let outcome = op(&state);

        let closed = self.remember_closed(&state.tabs, &outcome.tabs, connection_id);
        if closed == 0 && !outcome.created_new_tab {
            return outcome;
        }

        state.tabs = outcome.tabs.clone();
        match &outcome.active_tab_id {
            Some(id) => {
                state
                    .active_tab_ids
                    .insert(connection_id.to_string(), id.clone());
            }
            None => {
                state.active_tab_ids.remove(connection_id);
            }
        }
        self.persist(&state);

        tracing::info!(
            connection_id = %connection_id,
            closed,
            created_new_tab = outcome.created_new_tab,
            active = ?outcome.active_tab_id,
            "Closed tabs"
        );

        outcome
    }

    /// Push tabs of `connection_id` present in `before` but not in `after`
    /// onto the recently closed stack. Returns how many.
    fn remember_closed(
        &self,
        before: &[Arc<Tab>],
        after: &[Arc<Tab>],
        connection_id: &str,
    ) -> usize {
        let closed: Vec<ClosedTab> = before
            .iter()
            .enumerate()
            .filter(|(_, tab)| tab.belongs_to(connection_id))
            .filter(|(_, tab)| !after.iter().any(|kept| Arc::ptr_eq(kept, tab)))
            .map(|(index, tab)| ClosedTab {
                tab: Arc::clone(tab),
                index,
            })
            .collect();

        let count = closed.len();
        if count > 0 {
            let mut stack = self.recently_closed.write();
            stack.extend(closed);
            if stack.len() > MAX_RECENTLY_CLOSED {
                let overflow = stack.len() - MAX_RECENTLY_CLOSED;
                stack.drain(0..overflow);
            }
        }
        count
    }

    /// Reopen the most recently closed tab of `connection_id` at its former
    /// position and make it active.
    pub fn restore_last_closed(&self, connection_id: &str) -> Option<Arc<Tab>> {
        let closed = {
            let mut stack = self.recently_closed.write();
            let idx = stack
                .iter()
                .rposition(|closed| closed.tab.belongs_to(connection_id))?;
            stack.remove(idx)
        };

        let mut restored = Tab::clone(&closed.tab);
        restored.id = generate_tab_id();
        restored.is_loading = false;
        let restored = Arc::new(restored);

        let mut state = self.state.write();
        let index = closed.index.min(state.tabs.len());
        state.tabs.insert(index, Arc::clone(&restored));
        state
            .active_tab_ids
            .insert(connection_id.to_string(), restored.id.clone());
        self.persist(&state);

        tracing::info!(
            connection_id = %connection_id,
            tab_id = %restored.id,
            title = %restored.title,
            "Restored closed tab"
        );

        Some(restored)
    }

    /// Forget the recently closed tabs of a connection
    pub fn forget_closed_tabs(&self, connection_id: &str) {
        self.recently_closed
            .write()
            .retain(|closed| !closed.tab.belongs_to(connection_id));
    }

    // === Editing ===

    /// Merge `patch` into one tab. Unknown ids change nothing and return `None`.
    pub fn patch_tab(&self, tab_id: &str, patch: &TabPatch) -> Option<Arc<Tab>> {
        let mut state = self.state.write();
        state.tab(tab_id)?;

        let tabs = patch_tab(&state.tabs, tab_id, patch);
        let updated = tabs.iter().find(|tab| tab.id == tab_id).cloned();
        state.tabs = tabs;
        if patch.connection_id.is_some() {
            // A rebound tab may have been the active tab of its old connection
            state.repair_active_pointers();
        }
        self.persist(&state);

        updated
    }

    /// Move a tab to `new_index` in the global display order
    pub fn move_tab(&self, tab_id: &str, new_index: usize) {
        let mut state = self.state.write();
        if state.tab(tab_id).is_none() {
            return;
        }

        state.tabs = move_tab(&state.tabs, tab_id, new_index);
        self.persist(&state);
    }

    fn persist(&self, state: &SessionSnapshot) {
        self.store.save(&state.tabs, &state.active_tab_ids);
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            store: self.store.clone(),
            recently_closed: Arc::clone(&self.recently_closed),
        }
    }
}
