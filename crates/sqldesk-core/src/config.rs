//! Workspace configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Fallback `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
    /// Reopen the tabs of the previous run
    pub restore_session: bool,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("sqldesk.db"),
            log_filter: "info".to_string(),
            restore_session: true,
        }
    }

    pub fn data_dir() -> PathBuf {
        platform_data_dir()
            .map(|dir| dir.join("SQLDesk"))
            .unwrap_or_else(|| PathBuf::from(".sqldesk"))
    }

    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

/// Per-user application data root for the current platform
fn platform_data_dir() -> Option<PathBuf> {
    let env_path = |name: &str| std::env::var_os(name).map(PathBuf::from);

    if cfg!(target_os = "windows") {
        env_path("LOCALAPPDATA")
    } else if cfg!(target_os = "macos") {
        env_path("HOME").map(|home| home.join("Library/Application Support"))
    } else {
        env_path("XDG_DATA_HOME")
            .or_else(|| env_path("HOME").map(|home| home.join(".local/share")))
    }
}
