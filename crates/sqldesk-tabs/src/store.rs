//! Tab store operations
//!
//! All functions take the full tab list (every connection, display order)
//! and return a new list. Tabs that are not touched are the same `Arc`s as
//! in the input, so consumers can skip work with `Arc::ptr_eq`.
//!
//! Close operations keep two guarantees for the connection they act on:
//! it never ends up with zero tabs, and the returned active id always names
//! one of its remaining tabs. Unknown targets are no-ops.

use std::sync::Arc;

use crate::tab::{Tab, TabPatch};

/// Result of a close operation
#[derive(Debug, Clone)]
pub struct CloseOutcome {
    pub tabs: Vec<Arc<Tab>>,
    /// Active tab of the affected connection after the close
    pub active_tab_id: Option<String>,
    /// Whether a replacement tab was synthesized
    pub created_new_tab: bool,
}

impl CloseOutcome {
    fn unchanged(tabs: &[Arc<Tab>], active_tab_id: Option<&str>) -> Self {
        Self {
            tabs: tabs.to_vec(),
            active_tab_id: active_tab_id.map(str::to_string),
            created_new_tab: false,
        }
    }
}

/// Tabs owned by `connection_id`, in display order. `None` yields nothing.
pub fn tabs_for_connection(tabs: &[Arc<Tab>], connection_id: Option<&str>) -> Vec<Arc<Tab>> {
    let Some(connection_id) = connection_id else {
        return Vec::new();
    };

    tabs.iter()
        .filter(|tab| tab.belongs_to(connection_id))
        .cloned()
        .collect()
}

/// First table tab on `connection_id` browsing `table_name`
pub fn find_existing_table_tab(
    tabs: &[Arc<Tab>],
    connection_id: &str,
    table_name: Option<&str>,
) -> Option<Arc<Tab>> {
    let table_name = table_name?;
    tabs.iter()
        .find(|tab| tab.belongs_to(connection_id) && tab.is_table_for(table_name))
        .cloned()
}

/// Resolve an active pointer, rejecting ids that are gone or now owned by
/// another connection.
pub fn resolve_active_tab(
    tabs: &[Arc<Tab>],
    connection_id: Option<&str>,
    active_tab_id: Option<&str>,
) -> Option<Arc<Tab>> {
    let connection_id = connection_id?;
    let active_tab_id = active_tab_id?;

    tabs.iter()
        .find(|tab| tab.id == active_tab_id)
        .filter(|tab| tab.belongs_to(connection_id))
        .cloned()
}

/// Close one tab.
///
/// Closing the last tab of a connection appends a replacement built by
/// `create_tab` and makes it active. Closing the active tab selects its left
/// neighbour within the connection, or the new first tab.
pub fn close_single<F>(
    tabs: &[Arc<Tab>],
    connection_id: &str,
    target_id: &str,
    current_active_id: Option<&str>,
    create_tab: F,
) -> CloseOutcome
where
    F: FnOnce(&str) -> Tab,
{
    let Some(position) = tabs
        .iter()
        .filter(|tab| tab.belongs_to(connection_id))
        .position(|tab| tab.id == target_id)
    else {
        return CloseOutcome::unchanged(tabs, current_active_id);
    };

    let mut remaining: Vec<Arc<Tab>> = tabs
        .iter()
        .filter(|tab| !(tab.id == target_id && tab.belongs_to(connection_id)))
        .cloned()
        .collect();

    let sibling_count = remaining
        .iter()
        .filter(|tab| tab.belongs_to(connection_id))
        .count();

    if sibling_count == 0 {
        let replacement = Arc::new(create_tab(connection_id));
        let active_tab_id = replacement.id.clone();
        remaining.push(replacement);

        tracing::debug!(
            connection_id = %connection_id,
            tab_id = %active_tab_id,
            "Closed last tab, created replacement"
        );

        return CloseOutcome {
            tabs: remaining,
            active_tab_id: Some(active_tab_id),
            created_new_tab: true,
        };
    }

    if current_active_id != Some(target_id) {
        return CloseOutcome {
            tabs: remaining,
            active_tab_id: current_active_id.map(str::to_string),
            created_new_tab: false,
        };
    }

    // position - 1 < sibling_count, so this always finds a tab
    let next_id = remaining
        .iter()
        .filter(|tab| tab.belongs_to(connection_id))
        .nth(position.saturating_sub(1))
        .map(|tab| tab.id.clone());

    tracing::debug!(
        connection_id = %connection_id,
        closed = %target_id,
        active = ?next_id,
        "Closed active tab"
    );

    CloseOutcome {
        tabs: remaining,
        active_tab_id: next_id,
        created_new_tab: false,
    }
}

/// Close every tab of a connection and open one fresh replacement.
pub fn close_all_for_connection<F>(
    tabs: &[Arc<Tab>],
    connection_id: &str,
    create_tab: F,
) -> CloseOutcome
where
    F: FnOnce(&str) -> Tab,
{
    let mut remaining: Vec<Arc<Tab>> = tabs
        .iter()
        .filter(|tab| !tab.belongs_to(connection_id))
        .cloned()
        .collect();

    let replacement = Arc::new(create_tab(connection_id));
    let active_tab_id = replacement.id.clone();
    remaining.push(replacement);

    CloseOutcome {
        tabs: remaining,
        active_tab_id: Some(active_tab_id),
        created_new_tab: true,
    }
}

/// Close every tab of a connection except `keep_id`, which becomes active.
///
/// If `keep_id` is not one of the connection's tabs nothing changes and
/// `current_active_id` is returned as is.
pub fn close_others_for_connection(
    tabs: &[Arc<Tab>],
    connection_id: &str,
    keep_id: &str,
    current_active_id: Option<&str>,
) -> CloseOutcome {
    let keeps = |tab: &Arc<Tab>| tab.belongs_to(connection_id) && tab.id == keep_id;
    if !tabs.iter().any(keeps) {
        return CloseOutcome::unchanged(tabs, current_active_id);
    }

    let remaining = tabs
        .iter()
        .filter(|tab| !tab.belongs_to(connection_id) || keeps(*tab))
        .cloned()
        .collect();

    CloseOutcome {
        tabs: remaining,
        active_tab_id: Some(keep_id.to_string()),
        created_new_tab: false,
    }
}

/// Close the connection's tabs positioned before `target_id`.
pub fn close_to_left(
    tabs: &[Arc<Tab>],
    connection_id: &str,
    target_id: &str,
    fallback_active_id: Option<&str>,
) -> CloseOutcome {
    close_side(tabs, connection_id, target_id, fallback_active_id, Side::Left)
}

/// Close the connection's tabs positioned after `target_id`.
pub fn close_to_right(
    tabs: &[Arc<Tab>],
    connection_id: &str,
    target_id: &str,
    fallback_active_id: Option<&str>,
) -> CloseOutcome {
    close_side(tabs, connection_id, target_id, fallback_active_id, Side::Right)
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn covers(self, index: usize, target_index: usize) -> bool {
        match self {
            Side::Left => index < target_index,
            Side::Right => index > target_index,
        }
    }
}

fn close_side(
    tabs: &[Arc<Tab>],
    connection_id: &str,
    target_id: &str,
    fallback_active_id: Option<&str>,
    side: Side,
) -> CloseOutcome {
    let Some(target_index) = tabs
        .iter()
        .position(|tab| tab.id == target_id && tab.belongs_to(connection_id))
    else {
        return CloseOutcome::unchanged(tabs, fallback_active_id);
    };

    let mut active_closed = false;
    let mut remaining = Vec::with_capacity(tabs.len());
    for (index, tab) in tabs.iter().enumerate() {
        if tab.belongs_to(connection_id) && side.covers(index, target_index) {
            active_closed |= fallback_active_id == Some(tab.id.as_str());
        } else {
            remaining.push(Arc::clone(tab));
        }
    }

    let active_tab_id = if active_closed {
        Some(target_id)
    } else {
        fallback_active_id
    };

    CloseOutcome {
        tabs: remaining,
        active_tab_id: active_tab_id.map(str::to_string),
        created_new_tab: false,
    }
}

/// Apply `patch` to the tab with `tab_id`. Order is preserved and every
/// other tab is returned as the same `Arc`.
pub fn patch_tab(tabs: &[Arc<Tab>], tab_id: &str, patch: &TabPatch) -> Vec<Arc<Tab>> {
    tabs.iter()
        .map(|tab| {
            if tab.id == tab_id {
                let mut updated = Tab::clone(tab);
                updated.apply(patch);
                Arc::new(updated)
            } else {
                Arc::clone(tab)
            }
        })
        .collect()
}

/// Move a tab to `new_index` in the global order, clamped to the list end.
pub fn move_tab(tabs: &[Arc<Tab>], tab_id: &str, new_index: usize) -> Vec<Arc<Tab>> {
    let mut reordered = tabs.to_vec();
    if let Some(current_index) = reordered.iter().position(|tab| tab.id == tab_id) {
        let tab = reordered.remove(current_index);
        let insert_index = new_index.min(reordered.len());
        reordered.insert(insert_index, tab);
    }
    reordered
}
