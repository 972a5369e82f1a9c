//! Tab kinds
//!
//! Closed set of editor surfaces a tab can host:
//! ```text
//! console        free-form SQL buffer, editor panel open by default
//! table          browser for a single table, titled after it
//! query_builder  visual query builder
//! ```

use serde::{Deserialize, Serialize};

use crate::error::TabError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabKind {
    #[default]
    Console,
    Table,
    QueryBuilder,
}

impl TabKind {
    /// Label used for machine-generated titles
    pub fn base_label(&self) -> &'static str {
        match self {
            TabKind::Console => "Console",
            TabKind::Table => "Table",
            TabKind::QueryBuilder => "Visual Query",
        }
    }

    /// Whether the side-panel editor starts expanded for a new tab of this kind
    pub fn editor_open_by_default(&self) -> bool {
        matches!(self, TabKind::Console)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TabKind::Console => "console",
            TabKind::Table => "table",
            TabKind::QueryBuilder => "query_builder",
        }
    }
}

impl std::fmt::Display for TabKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TabKind {
    type Err = TabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" => Ok(TabKind::Console),
            "table" => Ok(TabKind::Table),
            "query_builder" => Ok(TabKind::QueryBuilder),
            _ => Err(TabError::UnknownKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for kind in [TabKind::Console, TabKind::Table, TabKind::QueryBuilder] {
            assert_eq!(kind.as_str().parse::<TabKind>().unwrap(), kind);
        }
        assert_eq!(
            "Query_Builder".parse::<TabKind>().unwrap(),
            TabKind::QueryBuilder
        );
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert_eq!(
            "chart".parse::<TabKind>(),
            Err(TabError::UnknownKind("chart".to_string()))
        );
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&TabKind::QueryBuilder).unwrap(),
            "\"query_builder\""
        );
        let kind: TabKind = serde_json::from_str("\"table\"").unwrap();
        assert_eq!(kind, TabKind::Table);
    }

    #[test]
    fn test_editor_defaults() {
        assert!(TabKind::Console.editor_open_by_default());
        assert!(!TabKind::Table.editor_open_by_default());
        assert!(!TabKind::QueryBuilder.editor_open_by_default());
    }
}
