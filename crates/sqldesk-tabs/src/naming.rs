//! Title policy for new tabs

use std::sync::Arc;

use crate::kind::TabKind;
use crate::tab::{Tab, TabOverrides};

/// Pick the title for a tab about to be opened on `connection_id`.
///
/// An explicit title wins. Table tabs are named after their table.
/// Consoles and query builders are numbered per connection and kind:
/// the first is `"Console"`, the next `"Console 2"`, and so on.
pub fn generate_title(
    existing: &[Arc<Tab>],
    connection_id: &str,
    candidate: &TabOverrides,
) -> String {
    if let Some(title) = &candidate.title {
        return title.clone();
    }

    let kind = candidate.kind();
    if kind == TabKind::Table {
        if let Some(table) = &candidate.active_table {
            return table.clone();
        }
    }

    let count = existing
        .iter()
        .filter(|tab| tab.belongs_to(connection_id) && tab.kind == kind)
        .count();

    if count == 0 {
        kind.base_label().to_string()
    } else {
        format!("{} {}", kind.base_label(), count + 1)
    }
}
