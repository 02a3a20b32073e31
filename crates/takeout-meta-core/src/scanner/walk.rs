use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Compile glob ignore patterns, logging and dropping invalid ones.
pub fn compile_ignore_patterns(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

/// Walk `root` in file-name order and collect the regular files accepted by
/// `keep`. Ignored paths are pruned, including whole directories. Symlinks
/// are not followed. Errors below the root are logged and skipped; a root
/// that is not a directory is an error.
pub fn walk_files<F>(
    root: &Path,
    recursive: bool,
    ignore_patterns: &[Pattern],
    keep: F,
) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    if !root.is_dir() {
        return Err(Error::RootNotFound(root.to_path_buf()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_entry(|entry| {
            !ignore_patterns
                .iter()
                .any(|pattern| pattern.matches_path(entry.path()))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Error walking {}: {}", root.display(), err);
                continue;
            }
        };

        if entry.file_type().is_file() && keep(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
