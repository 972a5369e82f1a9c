//! Session error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Tab {tab_id} not found on connection {connection_id}")]
    TabNotFound {
        connection_id: String,
        tab_id: String,
    },
}
