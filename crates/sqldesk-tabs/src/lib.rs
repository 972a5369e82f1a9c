//! SQLDesk Tab Store
//!
//! One flat, globally ordered list of editor tabs shared by every connection,
//! plus a per-connection active pointer kept by the caller.
//! Every operation here is a pure function over a snapshot: it returns a new
//! list and never mutates the input. Untouched tabs are shared by `Arc`.

mod error;
mod kind;
mod naming;
mod store;
mod tab;

pub use error::TabError;
pub use kind::TabKind;
pub use naming::generate_title;
pub use store::{
    close_all_for_connection, close_others_for_connection, close_single, close_to_left,
    close_to_right, find_existing_table_tab, move_tab, patch_tab, resolve_active_tab,
    tabs_for_connection, CloseOutcome,
};
pub use tab::{create_initial_tab, generate_tab_id, Tab, TabOverrides, TabPatch, TAB_ID_LEN};

pub type Result<T> = std::result::Result<T, TabError>;
