//! Tab data structure
//!
//! A tab is one open editor surface bound to a connection. The serialized
//! form uses camelCase field names; every field except `id` tolerates being
//! absent so older payloads still load.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::TabKind;

/// Length of a generated tab id
pub const TAB_ID_LEN: usize = 7;

const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    /// Session-scoped identifier, see [`generate_tab_id`]
    pub id: String,
    /// Display title, user-chosen or generated
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub kind: TabKind,
    /// Current SQL buffer
    #[serde(default)]
    pub query: String,
    /// Last execution result, kept opaque
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Last execution error; may follow an earlier successful result
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub execution_time_ms: Option<u64>,
    /// 1-based page of the active result set
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub active_table: Option<String>,
    #[serde(default)]
    pub pk_column: Option<String>,
    /// Owning connection; empty means "no connection yet"
    #[serde(default)]
    pub connection_id: String,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default)]
    pub is_editor_open: bool,
}

fn first_page() -> u32 {
    1
}

impl Tab {
    /// Shallow-merge a partial update into this tab
    pub fn apply(&mut self, patch: &TabPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(query) = &patch.query {
            self.query = query.clone();
        }
        if let Some(result) = &patch.result {
            self.result = result.clone();
        }
        if let Some(error) = &patch.error {
            self.error = error.clone();
        }
        if let Some(execution_time_ms) = patch.execution_time_ms {
            self.execution_time_ms = execution_time_ms;
        }
        if let Some(page) = patch.page {
            self.page = page;
        }
        if let Some(active_table) = &patch.active_table {
            self.active_table = active_table.clone();
        }
        if let Some(pk_column) = &patch.pk_column {
            self.pk_column = pk_column.clone();
        }
        if let Some(connection_id) = &patch.connection_id {
            self.connection_id = connection_id.clone();
        }
        if let Some(is_loading) = patch.is_loading {
            self.is_loading = is_loading;
        }
        if let Some(is_editor_open) = patch.is_editor_open {
            self.is_editor_open = is_editor_open;
        }
    }

    pub fn belongs_to(&self, connection_id: &str) -> bool {
        self.connection_id == connection_id
    }

    pub fn is_table_for(&self, table_name: &str) -> bool {
        self.kind == TabKind::Table && self.active_table.as_deref() == Some(table_name)
    }
}

/// Creation-time overrides for [`create_initial_tab`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabOverrides {
    pub kind: Option<TabKind>,
    pub title: Option<String>,
    pub query: Option<String>,
    pub active_table: Option<String>,
    pub pk_column: Option<String>,
    pub is_editor_open: Option<bool>,
}

impl TabOverrides {
    pub fn console() -> Self {
        Self {
            kind: Some(TabKind::Console),
            ..Self::default()
        }
    }

    pub fn query_builder() -> Self {
        Self {
            kind: Some(TabKind::QueryBuilder),
            ..Self::default()
        }
    }

    pub fn table(table_name: impl Into<String>, pk_column: Option<String>) -> Self {
        Self {
            kind: Some(TabKind::Table),
            active_table: Some(table_name.into()),
            pk_column,
            ..Self::default()
        }
    }

    pub fn kind(&self) -> TabKind {
        self.kind.unwrap_or_default()
    }
}

/// Partial update for [`crate::patch_tab`].
///
/// `None` leaves a field alone. Nullable fields take `Some(None)` to clear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabPatch {
    pub title: Option<String>,
    pub query: Option<String>,
    pub result: Option<Option<serde_json::Value>>,
    pub error: Option<Option<String>>,
    pub execution_time_ms: Option<Option<u64>>,
    pub page: Option<u32>,
    pub active_table: Option<Option<String>>,
    pub pk_column: Option<Option<String>>,
    pub connection_id: Option<String>,
    pub is_loading: Option<bool>,
    pub is_editor_open: Option<bool>,
}

/// Generate a 7-character `[a-z0-9]` tab id from the clock and a random uuid.
///
/// Ids are best-effort unique; no registry is consulted.
pub fn generate_tab_id() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u128;
    let mut seed = Uuid::new_v4().as_u128() ^ nanos;

    (0..TAB_ID_LEN)
        .map(|_| {
            let digit = ID_ALPHABET[(seed % 36) as usize] as char;
            seed /= 36;
            digit
        })
        .collect()
}

/// Build a fresh tab for `connection_id` with defaults, then apply overrides.
///
/// A missing connection id becomes the empty string.
pub fn create_initial_tab(connection_id: Option<&str>, overrides: TabOverrides) -> Tab {
    let kind = overrides.kind();
    let title = overrides.title.unwrap_or_else(|| match kind {
        TabKind::Table => overrides
            .active_table
            .clone()
            .unwrap_or_else(|| kind.base_label().to_string()),
        _ => kind.base_label().to_string(),
    });

    Tab {
        id: generate_tab_id(),
        title,
        kind,
        query: overrides.query.unwrap_or_default(),
        result: None,
        error: None,
        execution_time_ms: None,
        page: 1,
        active_table: overrides.active_table,
        pk_column: overrides.pk_column,
        connection_id: connection_id.unwrap_or_default().to_string(),
        is_loading: false,
        is_editor_open: overrides
            .is_editor_open
            .unwrap_or_else(|| kind.editor_open_by_default()),
    }
}
