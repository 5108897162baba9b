//! Subscriber index service
//!
//! Coordinates parsing, subscription extraction and the persistent event
//! index for one workspace. This is the entry point the CLI and the file
//! watcher drive.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::discovery::{discover_files, is_supported, to_relative};
use crate::event_index::{
    execute_search, EventIndexStore, EventQuery, EventSearchResult, EventStoreError,
};
use crate::project_settings::{load_settings_or_default, IndexerSettings};
use crate::subscriber::{EventSubscription, ExtractionRules, FilePayload, SubscriptionPipeline};
use crate::tree_sitter::{SourceParser, TreeSitterError, TreeSitterParser};

/// Error type for subscriber index operations
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Not a PHP file: {0}")]
    UnsupportedFile(String),
    #[error("Parser error: {0}")]
    Parser(#[from] TreeSitterError),
    #[error("Index error: {0}")]
    Store(#[from] EventStoreError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
    #[error("Parser lock poisoned")]
    Poisoned,
}

/// Result of indexing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Extraction ran and the store was updated
    Indexed(FilePayload),
    /// Content and rules unchanged since the last run; payload from the store
    Unchanged(FilePayload),
}

impl IndexOutcome {
    pub fn payload(&self) -> &FilePayload {
        match self {
            IndexOutcome::Indexed(payload) | IndexOutcome::Unchanged(payload) => payload,
        }
    }
}

/// Statistics about indexing operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub files_discovered: usize,
    pub files_indexed: usize,
    pub files_unchanged: usize,
    pub files_failed: usize,
    pub files_removed: usize,
    pub subscriptions: usize,
    pub duration_ms: u64,
}

/// Subscriber index for one workspace
pub struct SubscriberIndex {
    /// Workspace root path
    workspace_root: PathBuf,
    settings: IndexerSettings,
    pipeline: SubscriptionPipeline,
    /// Parser for single-file requests; batch workers own their own
    parser: Mutex<TreeSitterParser>,
    store: Arc<EventIndexStore>,
}

impl SubscriberIndex {
    pub fn new(
        workspace_root: PathBuf,
        store: Arc<EventIndexStore>,
        settings: IndexerSettings,
    ) -> Result<Self, IndexError> {
        let parser = TreeSitterParser::new()?;
        let pipeline = SubscriptionPipeline::new(settings.extraction_rules());

        Ok(Self {
            workspace_root,
            settings,
            pipeline,
            parser: Mutex::new(parser),
            store,
        })
    }

    /// Open the index for a workspace with its on-disk settings
    pub fn open(workspace_root: PathBuf, db_path: &Path) -> Result<Self, IndexError> {
        let settings = load_settings_or_default(&workspace_root);
        let store = Arc::new(EventIndexStore::new(db_path)?);
        Self::new(workspace_root, store, settings)
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn settings(&self) -> &IndexerSettings {
        &self.settings
    }

    pub fn rules(&self) -> &ExtractionRules {
        self.pipeline.rules()
    }

    pub fn store(&self) -> &Arc<EventIndexStore> {
        &self.store
    }

    /// Input filter: only PHP sources are ever indexed
    pub fn is_supported(&self, file_path: &str) -> bool {
        is_supported(file_path)
    }

    /// Index a single workspace file
    pub fn index_file(&self, file_path: &str) -> Result<IndexOutcome, IndexError> {
        if !self.is_supported(file_path) {
            return Err(IndexError::UnsupportedFile(file_path.to_string()));
        }
        let content = std::fs::read_to_string(self.resolve_path(file_path))?;
        self.index_content(file_path, &content)
    }

    /// Index an in-memory buffer under a workspace path
    pub fn index_content(&self, file_path: &str, content: &str) -> Result<IndexOutcome, IndexError> {
        if !self.is_supported(file_path) {
            return Err(IndexError::UnsupportedFile(file_path.to_string()));
        }
        let mut parser = self.parser.lock().map_err(|_| IndexError::Poisoned)?;
        self.index_with(&mut *parser, file_path, content)
    }

    fn index_with<P: SourceParser>(
        &self,
        parser: &mut P,
        file_path: &str,
        content: &str,
    ) -> Result<IndexOutcome, IndexError> {
        let hash = self.fingerprint(content);

        if !self.store.needs_reindex(file_path, &hash)? {
            if let Some(payload) = self.store.file_payload(file_path)? {
                return Ok(IndexOutcome::Unchanged(payload));
            }
        }

        let payload = self.pipeline.run(parser, content, self.settings.enabled);
        self.store.put(file_path, &hash, &payload)?;

        tracing::debug!(
            "[SubscriberIndex] Indexed {} subscriptions in {}",
            payload.subscription_count(),
            file_path
        );
        Ok(IndexOutcome::Indexed(payload))
    }

    /// Forget a deleted or no longer accepted file
    pub fn remove_file(&self, file_path: &str) -> Result<bool, IndexError> {
        let removed = self.store.remove_file(file_path)?;
        if removed {
            tracing::debug!("[SubscriberIndex] Removed {}", file_path);
        }
        Ok(removed)
    }

    /// Index every supported file in the workspace and drop files that
    /// disappeared since the last run
    pub fn index_workspace(&self) -> Result<IndexStats, IndexError> {
        let start = Instant::now();
        let files = discover_files(&self.workspace_root, &self.settings);

        let mut stats = IndexStats {
            files_discovered: files.len(),
            ..Default::default()
        };

        let discovered: HashSet<&str> = files.iter().map(String::as_str).collect();
        for indexed in self.store.indexed_files()? {
            if !discovered.contains(indexed.file_path.as_str()) && self.remove_file(&indexed.file_path)? {
                stats.files_removed += 1;
            }
        }

        let next = AtomicUsize::new(0);
        let indexed = AtomicUsize::new(0);
        let unchanged = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let subscriptions = AtomicUsize::new(0);
        let workers = self.settings.worker_count().min(files.len()).max(1);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    let mut parser = match TreeSitterParser::new() {
                        Ok(parser) => parser,
                        Err(e) => {
                            tracing::warn!("[SubscriberIndex] Worker could not start: {}", e);
                            return;
                        }
                    };

                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        let Some(file_path) = files.get(i) else {
                            break;
                        };

                        let result = std::fs::read_to_string(self.resolve_path(file_path))
                            .map_err(IndexError::from)
                            .and_then(|content| self.index_with(&mut parser, file_path, &content));

                        match result {
                            Ok(outcome) => {
                                subscriptions.fetch_add(
                                    outcome.payload().subscription_count(),
                                    Ordering::Relaxed,
                                );
                                match outcome {
                                    IndexOutcome::Indexed(_) => indexed.fetch_add(1, Ordering::Relaxed),
                                    IndexOutcome::Unchanged(_) => unchanged.fetch_add(1, Ordering::Relaxed),
                                };
                            }
                            Err(e) => {
                                failed.fetch_add(1, Ordering::Relaxed);
                                tracing::warn!("[SubscriberIndex] Failed to index {}: {}", file_path, e);
                            }
                        }
                    }
                });
            }
        });

        stats.files_indexed = indexed.into_inner();
        stats.files_unchanged = unchanged.into_inner();
        stats.files_failed = failed.into_inner();
        stats.subscriptions = subscriptions.into_inner();
        stats.duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "[SubscriberIndex] Indexed {} files ({} unchanged, {} failed, {} removed), {} subscriptions in {}ms",
            stats.files_indexed,
            stats.files_unchanged,
            stats.files_failed,
            stats.files_removed,
            stats.subscriptions,
            stats.duration_ms
        );

        Ok(stats)
    }

    /// Every handler registered for `event`, with the file declaring it
    pub fn lookup_by_event(&self, event: &str) -> Result<Vec<(String, EventSubscription)>, IndexError> {
        Ok(self.store.lookup_by_event(event)?)
    }

    /// Search indexed events by name
    pub fn search_events(&self, query: &EventQuery) -> Result<Vec<EventSearchResult>, IndexError> {
        Ok(execute_search(&self.store, query)?)
    }

    /// Get statistics about the index
    pub fn stats(&self) -> Result<IndexStats, IndexError> {
        Ok(IndexStats {
            files_indexed: self.store.file_count()?,
            subscriptions: self.store.count()?,
            ..Default::default()
        })
    }

    pub fn resolve_path(&self, file_path: &str) -> PathBuf {
        if Path::new(file_path).is_absolute() {
            PathBuf::from(file_path)
        } else {
            self.workspace_root.join(file_path)
        }
    }

    pub fn to_relative(&self, abs_path: &Path) -> Option<String> {
        to_relative(&self.workspace_root, abs_path)
    }

    /// Change-detection hash over the content and everything that shapes
    /// extraction, so a settings change forces re-extraction.
    ///
    /// `DefaultHasher` output is not stable across Rust releases; a binary
    /// built with another toolchain re-extracts every file once.
    fn fingerprint(&self, content: &str) -> String {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        self.settings.enabled.hash(&mut hasher);
        let rules = self.pipeline.rules();
        rules.method_name.hash(&mut hasher);
        rules.convention.markers.hash(&mut hasher);
        rules.convention.separator.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }
}
