//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] sqldesk_storage::StorageError),

    #[error("Tab error: {0}")]
    Tab(#[from] sqldesk_tabs::TabError),

    #[error("Session error: {0}")]
    Session(#[from] sqldesk_session::SessionError),

    #[error("Schema error: {0}")]
    Schema(#[from] sqldesk_schema::SchemaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
