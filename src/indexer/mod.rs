pub mod discovery;
pub mod service;
pub mod watcher;

pub use discovery::{discover_files, is_supported, FileFilter};
pub use service::{IndexError, IndexOutcome, IndexStats, SubscriberIndex};
pub use watcher::IndexWatcher;
