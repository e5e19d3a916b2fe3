use crate::error::QueryError;
use crate::languages;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Source files below `path` in a language with a grammar, sorted by path.
///
/// Honors `.gitignore`, `.ignore` and global excludes and skips hidden
/// entries. `max_depth` counts levels below `path` (0 = only `path` itself).
/// Unreadable entries are logged and skipped.
pub fn walk_directory(path: &Path, max_depth: Option<usize>, ext_filter: &[String]) -> Result<Vec<PathBuf>, QueryError> {
    if !path.is_dir() {
        return Err(QueryError::InvalidPath(format!("{} is not a directory", path.display())));
    }

    let mut builder = WalkBuilder::new(path);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .sort_by_file_path(|a, b| a.cmp(b));
    // ignore's max_depth counts the root itself
    if let Some(d) = max_depth {
        builder.max_depth(Some(d + 1));
    }

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(root = %path.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        let entry_path = entry.path();
        if !entry_path.is_file() || !languages::is_supported_file(entry_path) {
            continue;
        }
        let wanted = ext_filter.is_empty()
            || entry_path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext_filter.iter().any(|f| f == ext));
        if wanted {
            files.push(entry_path.to_path_buf());
        }
    }

    tracing::debug!(root = %path.display(), files = files.len(), "walked directory");
    Ok(files)
}
