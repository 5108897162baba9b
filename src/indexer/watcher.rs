use super::discovery::{is_gitignore_file, FileFilter};
use super::service::{IndexError, SubscriberIndex};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Keeps the subscriber index in sync with the workspace on disk.
/// Dropping the watcher stops the update loop.
pub struct IndexWatcher {
    _watcher: RecommendedWatcher,
}

impl IndexWatcher {
    pub fn new(index: Arc<SubscriberIndex>) -> Result<Self, IndexError> {
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = tx.send(event);
                }
            },
            Config::default(),
        )?;

        watcher.watch(index.workspace_root(), RecursiveMode::Recursive)?;
        tracing::info!(
            "[IndexWatcher] Watching {}",
            index.workspace_root().display()
        );

        std::thread::spawn(move || {
            debounced_update_loop(index, rx);
        });

        Ok(Self { _watcher: watcher })
    }
}

fn debounced_update_loop(index: Arc<SubscriberIndex>, rx: mpsc::Receiver<Event>) {
    let mut filter = FileFilter::load(index.workspace_root(), index.settings());
    let mut pending_changes: HashSet<String> = HashSet::new();
    let mut last_change = Instant::now();
    let debounce_duration = Duration::from_millis(index.settings().watch_debounce_ms);
    let poll = debounce_duration.min(Duration::from_millis(500)).max(Duration::from_millis(10));

    loop {
        match rx.recv_timeout(poll) {
            Ok(event) => {
                if event.paths.iter().any(|p| is_gitignore_file(p)) {
                    filter = FileFilter::load(index.workspace_root(), index.settings());
                }
                pending_changes.extend(extract_paths(&index, &filter, &event));
                last_change = Instant::now();
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if !pending_changes.is_empty() && last_change.elapsed() >= debounce_duration {
                    apply_changes(&index, &pending_changes);
                    pending_changes.clear();
                }
            }
        }
    }
}

/// Workspace-relative paths touched by an event that discovery would also pick up
fn extract_paths(index: &SubscriberIndex, filter: &FileFilter, event: &Event) -> Vec<String> {
    event
        .paths
        .iter()
        .filter_map(|p| index.to_relative(p))
        .filter(|rel| filter.accepts(rel))
        .collect()
}

fn apply_changes(index: &SubscriberIndex, paths: &HashSet<String>) {
    let mut paths: Vec<_> = paths.iter().collect();
    paths.sort();

    for path in paths {
        let result = if index.resolve_path(path).exists() {
            index.index_file(path).map(|_| ())
        } else {
            index.remove_file(path).map(|_| ())
        };

        if let Err(e) = result {
            tracing::warn!("[IndexWatcher] Failed to update {}: {}", path, e);
        }
    }
}
