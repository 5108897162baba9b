use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::project_settings::get_settings_dir;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "SUBSCRIBER_INDEX_LOG";

/// Default location of a workspace's index database.
///
/// Lives in the user cache directory, one file per workspace root, and falls
/// back to the workspace's settings directory when no home is available.
pub fn default_database_path(workspace_root: &Path) -> PathBuf {
    let file_name = format!("{}.db", workspace_key(workspace_root));
    let Some(dirs) = ProjectDirs::from("de", "espend", "subscriber-index") else {
        return get_settings_dir(workspace_root).join("index.db");
    };
    dirs.cache_dir().join(file_name)
}

fn workspace_key(workspace_root: &Path) -> String {
    let canonical = workspace_root
        .canonicalize()
        .unwrap_or_else(|_| workspace_root.to_path_buf());
    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);

    let name = canonical
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("workspace");
    format!("{}-{:x}", name, hasher.finish())
}
