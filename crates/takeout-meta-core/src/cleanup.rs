use chrono::Local;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::classify;

#[derive(Debug, Default, Clone, Serialize)]
pub struct CleanupReport {
    pub total: usize,
    pub deleted: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Deletes sidecar files once nothing needs them, optionally keeping a
/// backup copy. In dry-run mode nothing is touched but the report lists
/// what would have been deleted.
#[derive(Debug, Default, Clone)]
pub struct SidecarCleaner {
    dry_run: bool,
    backup_dir: Option<PathBuf>,
}

impl SidecarCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn backup_dir(mut self, backup_dir: Option<PathBuf>) -> Self {
        self.backup_dir = backup_dir;
        self
    }

    pub fn delete(&self, paths: &[PathBuf]) -> CleanupReport {
        info!(
            "{} {} sidecar file(s)",
            if self.dry_run { "Would delete" } else { "Deleting" },
            paths.len()
        );

        let mut report = CleanupReport {
            total: paths.len(),
            ..CleanupReport::default()
        };

        for path in paths {
            if !path.exists() {
                debug!("File does not exist: {}", path.display());
                report.skipped.push(path.clone());
                continue;
            }

            if !classify::is_sidecar(path) {
                warn!("Not a sidecar file, skipping: {}", path.display());
                report.skipped.push(path.clone());
                continue;
            }

            match self.delete_one(path) {
                Ok(()) => report.deleted.push(path.clone()),
                Err(err) => {
                    warn!("Error deleting {}: {}", path.display(), err);
                    report.failed.push((path.clone(), err.to_string()));
                }
            }
        }

        info!(
            "Cleanup complete: {} deleted, {} failed, {} skipped",
            report.deleted.len(),
            report.failed.len(),
            report.skipped.len()
        );

        report
    }

    fn delete_one(&self, path: &Path) -> io::Result<()> {
        if self.dry_run {
            debug!("Would delete: {}", path.display());
            return Ok(());
        }

        if let Some(backup_dir) = &self.backup_dir {
            let backup = create_backup(path, backup_dir)?;
            debug!("Backed up to: {}", backup.display());
        }

        fs::remove_file(path)?;
        debug!("Deleted: {}", path.display());
        Ok(())
    }
}

/// Copy `path` to `<backup_dir>/<name>.backup`, inserting a timestamp when
/// that name is already taken.
fn create_backup(path: &Path, backup_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(backup_dir)?;

    let name = path.file_name().unwrap_or_default();
    let mut backup_name = name.to_os_string();
    backup_name.push(".backup");
    let mut backup_path = backup_dir.join(&backup_name);
    if backup_path.exists() {
        let mut stamped = name.to_os_string();
        stamped.push(format!(".{}.backup", Local::now().format("%Y%m%d_%H%M%S%.3f")));
        backup_path = backup_dir.join(stamped);
    }

    fs::copy(path, &backup_path)?;
    Ok(backup_path)
}
