//! Persisted toolbar layout and the reconciliation of a saved layout against
//! the buttons available in the current session.

pub mod reconcile;
pub mod store;

pub use reconcile::{bootstrap, reconcile, AvailableButton, DEFAULT_HIDDEN_COMMANDS};
pub use store::{
    decode, decode_with, encode, FileStorage, LayoutError, LayoutFormat, LayoutRecord,
    LayoutStorage, MemoryStorage, MAX_BUTTONS,
};
