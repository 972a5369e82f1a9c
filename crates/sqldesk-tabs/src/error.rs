//! Tab error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TabError {
    #[error("Unknown tab kind: {0}")]
    UnknownKind(String),
}
