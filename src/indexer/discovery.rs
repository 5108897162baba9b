//! Workspace file discovery
//!
//! Finds the PHP files an index run should look at. Discovery and the file
//! watcher share one [`FileFilter`], so a path accepted by one is accepted
//! by the other.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::{Match, WalkBuilder};
use std::path::{Component, Path, PathBuf};

use crate::project_settings::IndexerSettings;
use crate::tree_sitter::Language;

const GITIGNORE_FILE: &str = ".gitignore";

/// Check if a path is a file the subscriber index accepts
pub fn is_supported(path: &str) -> bool {
    Language::from_path(path).is_some()
}

/// Workspace-relative path with forward slashes
pub fn to_relative(workspace_root: &Path, abs_path: &Path) -> Option<String> {
    abs_path
        .strip_prefix(workspace_root)
        .ok()
        .and_then(|p| p.to_str())
        .map(|s| s.replace('\\', "/"))
}

/// Check whether a path names a .gitignore file
pub fn is_gitignore_file(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()) == Some(GITIGNORE_FILE)
}

/// Which workspace files belong in the index: supported type, no hidden or
/// ignored directory on the way, not excluded by any .gitignore
pub struct FileFilter {
    workspace_root: PathBuf,
    ignored_dirs: Vec<String>,
    /// Shallowest first; deeper files take precedence
    gitignores: Vec<Gitignore>,
}

impl FileFilter {
    /// Build the filter by scanning the workspace for .gitignore files
    pub fn load(workspace_root: &Path, settings: &IndexerSettings) -> Self {
        let (_, gitignore_files) = walk(workspace_root, settings);
        Self::from_gitignore_files(workspace_root, settings, gitignore_files)
    }

    fn from_gitignore_files(
        workspace_root: &Path,
        settings: &IndexerSettings,
        mut gitignore_files: Vec<PathBuf>,
    ) -> Self {
        let mut gitignores = Vec::new();

        if settings.respect_gitignore {
            let exclude = workspace_root.join(".git").join("info").join("exclude");
            if exclude.is_file() {
                let mut builder = GitignoreBuilder::new(workspace_root);
                if let Some(e) = builder.add(&exclude) {
                    tracing::warn!("[Discovery] Failed to load {}: {}", exclude.display(), e);
                }
                match builder.build() {
                    Ok(gitignore) => gitignores.push(gitignore),
                    Err(e) => tracing::warn!("[Discovery] Failed to build exclude matcher: {}", e),
                }
            }

            gitignore_files.sort_by_key(|p| p.components().count());
            for path in gitignore_files {
                let (gitignore, err) = Gitignore::new(&path);
                if let Some(e) = err {
                    tracing::warn!("[Discovery] Failed to load {}: {}", path.display(), e);
                }
                gitignores.push(gitignore);
            }
        }

        Self {
            workspace_root: workspace_root.to_path_buf(),
            ignored_dirs: settings.ignored_dirs.clone(),
            gitignores,
        }
    }

    /// Check a workspace-relative path
    pub fn accepts(&self, rel_path: &str) -> bool {
        if !is_supported(rel_path) {
            return false;
        }

        let rel = Path::new(rel_path);
        let names: Vec<&str> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => name.to_str(),
                _ => None,
            })
            .collect();
        let Some((_, dirs)) = names.split_last() else {
            return false;
        };
        if names.iter().any(|n| n.starts_with('.')) {
            return false;
        }
        if dirs.iter().any(|d| self.ignored_dirs.iter().any(|i| i == d)) {
            return false;
        }

        !self.is_gitignored(&self.workspace_root.join(rel))
    }

    fn is_gitignored(&self, abs_path: &Path) -> bool {
        for gitignore in self.gitignores.iter().rev() {
            if !abs_path.starts_with(gitignore.path()) {
                continue;
            }
            match gitignore.matched_path_or_any_parents(abs_path, false) {
                Match::Ignore(_) => return true,
                Match::Whitelist(_) => return false,
                Match::None => {}
            }
        }
        false
    }
}

/// Walk the workspace once: candidate files and .gitignore files.
/// Hidden and ignored directories are never entered.
fn walk(workspace_root: &Path, settings: &IndexerSettings) -> (Vec<String>, Vec<PathBuf>) {
    let ignored_dirs = settings.ignored_dirs.clone();
    let walker = WalkBuilder::new(workspace_root)
        .standard_filters(false)
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
            let name = entry.file_name().to_str().unwrap_or("");
            !(is_dir && (name.starts_with('.') || ignored_dirs.iter().any(|d| d == name)))
        })
        .build();

    let mut files = Vec::new();
    let mut gitignore_files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("[Discovery] Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        if is_gitignore_file(entry.path()) {
            gitignore_files.push(entry.path().to_path_buf());
        } else if let Some(rel_path) = to_relative(workspace_root, entry.path()) {
            if is_supported(&rel_path) {
                files.push(rel_path);
            }
        }
    }

    (files, gitignore_files)
}

/// Get list of all indexable files in the workspace, sorted
pub fn discover_files(workspace_root: &Path, settings: &IndexerSettings) -> Vec<String> {
    let (candidates, gitignore_files) = walk(workspace_root, settings);
    let filter = FileFilter::from_gitignore_files(workspace_root, settings, gitignore_files);

    let mut files: Vec<String> = candidates
        .into_iter()
        .filter(|f| filter.accepts(f))
        .collect();
    files.sort();
    files
}
