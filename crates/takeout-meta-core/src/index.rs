use dashmap::DashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{trace, warn};

use crate::classify;

/// Per-directory cache of sidecar candidates.
///
/// A directory is listed the first time it is asked for and never again
/// until [`DirectoryIndex::clear`]. The populate-on-miss path runs inside the
/// map's entry lock, so an index shared between threads lists each directory
/// at most once; reads of an already listed directory only take a shard read
/// lock.
#[derive(Debug, Default)]
pub struct DirectoryIndex {
    entries: DashMap<PathBuf, Arc<[PathBuf]>>,
}

impl DirectoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sidecar candidates of `dir`, sorted by file name.
    pub fn list_sidecars(&self, dir: &Path) -> Arc<[PathBuf]> {
        let key = normalize_dir(dir);

        if let Some(cached) = self.entries.get(&key) {
            return Arc::clone(cached.value());
        }

        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::from(read_sidecars(&key)));
        Arc::clone(entry.value())
    }

    /// Pre-populate a directory without touching the filesystem.
    pub fn insert(&self, dir: &Path, mut candidates: Vec<PathBuf>) {
        candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        self.entries.insert(normalize_dir(dir), Arc::from(candidates));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lexical normalization only; the filesystem is not consulted.
pub fn normalize_dir(dir: &Path) -> PathBuf {
    let normalized: PathBuf = dir.components().collect();
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

fn read_sidecars(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Error listing directory {}: {}", dir.display(), err);
            return Vec::new();
        }
    };

    let mut sidecars: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(err) => {
                warn!("Error reading entry in directory {}: {}", dir.display(), err);
                None
            }
        })
        .filter(|path| classify::is_sidecar(path) && path.is_file())
        .collect();

    sidecars.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    trace!("Indexed {} sidecars in {}", sidecars.len(), dir.display());
    sidecars
}
