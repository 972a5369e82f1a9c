//! Schema cache error types

use thiserror::Error;

/// Failure reported by a [`crate::SchemaFetcher`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SchemaFetchError {
    message: String,
}

impl SchemaFetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema fetch failed for connection {connection_id}: {source}")]
    Fetch {
        connection_id: String,
        #[source]
        source: SchemaFetchError,
    },
}
