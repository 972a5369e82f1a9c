//! SQLDesk Session Management
//!
//! - The session is the flat tab list plus one active tab per connection
//! - Every mutation replaces the whole snapshot, then saves it best-effort
//! - A connection that has tabs always has exactly one resolvable active tab
//! - Unreadable saved state degrades to an empty session

mod error;
mod manager;
mod persistence;
mod snapshot;

pub use error::SessionError;
pub use manager::{SessionManager, MAX_RECENTLY_CLOSED};
pub use persistence::{PersistedState, SessionStore, SESSION_STATE_KEY};
pub use snapshot::SessionSnapshot;

pub type Result<T> = std::result::Result<T, SessionError>;
