//! Event Index
//!
//! Persistent, versioned storage for extracted subscriptions keyed by target
//! event. Uses SQLite; each `(file, event)` fragment is stored as one
//! bincode blob so a file's entries are replaced atomically.

pub mod search;
pub mod store;

pub use search::{execute_search, EventQuery, EventSearchResult};
pub use store::{
    EventIndexStore, EventStoreError, EventSummary, IndexedFile, INDEX_ID, SCHEMA_VERSION,
};
