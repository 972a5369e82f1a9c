//! SQLDesk Core
//!
//! Wires storage, the editor session and the schema cache into one
//! [`Workspace`]. The backend owns all editor state; the UI renders
//! snapshots and sends actions.

mod config;
mod error;
mod workspace;

pub use config::Config;
pub use error::CoreError;
pub use workspace::Workspace;

// Re-export core components
pub use sqldesk_schema::{
    SchemaCache, SchemaCacheEntry, SchemaCacheKey, SchemaError, SchemaFetchError, SchemaFetcher,
    TableSchema,
};
pub use sqldesk_session::{SessionError, SessionManager, SessionSnapshot};
pub use sqldesk_storage::{Database, StorageError};
pub use sqldesk_tabs::{CloseOutcome, Tab, TabError, TabKind, TabOverrides, TabPatch};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging. `RUST_LOG` wins over `default_filter`.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed by an embedding host
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
