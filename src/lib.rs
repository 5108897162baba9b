//! Index of Shopware init-resource subscriptions.
//!
//! Scans PHP subscriber classes for `getSubscribedEvents()` arrays, keeps
//! the `Enlight_Bootstrap_InitResource_*` registrations in a persistent
//! per-workspace index and answers "which handlers provide this service".

pub mod config;
pub mod event_index;
pub mod indexer;
pub mod project_settings;
pub mod subscriber;
pub mod tree_sitter;

pub use event_index::{EventIndexStore, EventQuery, EventSearchResult};
pub use indexer::{IndexError, IndexStats, IndexWatcher, SubscriberIndex};
pub use subscriber::{EventSubscription, FilePayload, SubscriptionPipeline};
