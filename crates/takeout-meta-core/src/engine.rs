use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::batch::{BatchMatcher, CancelToken, MatchStats};
use crate::config::{self, AppConfig};
use crate::error::{Error, Result};
use crate::matcher::{MatchResult, SidecarMatcher};
use crate::orphans::OrphanDetector;
use crate::progress::{ProgressReporter, SilentReporter};

/// Runs the matcher or the orphan detector over every configured root.
///
/// Roots are reduced to non-overlapping directories and processed in
/// parallel. Each root gets its own directory index, so no cache is shared
/// between roots. Output keeps root order, then traversal order.
pub struct TakeoutEngine {
    config: AppConfig,
}

#[derive(Debug)]
pub struct MatchRun {
    pub walk_duration: Duration,
    pub match_duration: Duration,
    pub results: Vec<MatchResult>,
    pub stats: MatchStats,
    pub cancelled: bool,
}

#[derive(Debug)]
pub struct OrphanRun {
    pub duration: Duration,
    pub orphans: Vec<PathBuf>,
}

/// Folds per-root progress into one running count.
struct SharedProgress<'a> {
    done: AtomicUsize,
    total: usize,
    inner: &'a dyn ProgressReporter,
}

impl ProgressReporter for SharedProgress<'_> {
    fn on_match_progress(&self, _files_matched: usize, _total_files: usize) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.on_match_progress(done, self.total);
    }
}

impl TakeoutEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    fn roots(&self) -> Result<Vec<PathBuf>> {
        let non_overlapping = config::non_overlapping_directories(self.config.root_paths.clone());
        if non_overlapping.is_empty() {
            return Err(Error::Other("No root paths configured".to_string()));
        }
        info!("Processing directories: {:?}", non_overlapping);
        Ok(non_overlapping.into_iter().map(PathBuf::from).collect())
    }

    /// Match every media file under the configured roots:
    /// 1. Parallel walk of each root (media files in file-name order)
    /// 2. Per-file sidecar matching, stopping early on `cancel`
    pub fn run_match(
        &self,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<MatchRun> {
        let suffixes = self.config.suffix_set()?;
        let roots = self.roots()?;

        // Phase 1: Walk
        reporter.on_walk_start();
        let walk_start = Instant::now();
        let batches = roots
            .par_iter()
            .map(|root| {
                let batch = BatchMatcher::new(SidecarMatcher::new(suffixes.clone()))
                    .with_ignore_patterns(&self.config.ignore_patterns);
                let files = batch.collect_media(root, self.config.recursive)?;
                debug!("{} media files under {}", files.len(), root.display());
                Ok((batch, files))
            })
            .collect::<Result<Vec<_>>>()?;
        let walk_duration = walk_start.elapsed();

        let total: usize = batches.iter().map(|(_, files)| files.len()).sum();
        reporter.on_walk_complete(total, walk_duration.as_secs_f64());
        info!("Found {} media files to process", total);

        // Phase 2: Match
        reporter.on_match_start(total);
        let match_start = Instant::now();
        let progress = SharedProgress {
            done: AtomicUsize::new(0),
            total,
            inner: reporter,
        };
        let results: Vec<MatchResult> = batches
            .par_iter()
            .map(|(batch, files)| batch.match_files(files, cancel, &progress))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();
        let match_duration = match_start.elapsed();

        let stats = MatchStats::from_results(&results);
        reporter.on_match_complete(&stats, match_duration.as_secs_f64());
        info!(
            "Matched {}/{} media files with sidecar metadata",
            stats.matched,
            stats.total()
        );

        Ok(MatchRun {
            walk_duration,
            match_duration,
            results,
            stats,
            cancelled: cancel.is_cancelled(),
        })
    }

    /// Find orphaned sidecars under every configured root.
    pub fn run_orphans(&self, reporter: &dyn ProgressReporter) -> Result<OrphanRun> {
        let suffixes = self.config.suffix_set()?;
        let roots = self.roots()?;

        reporter.on_orphan_scan_start();
        let start = Instant::now();
        let orphans: Vec<PathBuf> = roots
            .par_iter()
            .map(|root| {
                OrphanDetector::new(suffixes.clone(), self.config.truncation_budget)
                    .with_ignore_patterns(&self.config.ignore_patterns)
                    .find_orphans_with(root, self.config.recursive, &SilentReporter)
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();
        let duration = start.elapsed();
        reporter.on_orphan_scan_complete(orphans.len(), duration.as_secs_f64());

        Ok(OrphanRun { duration, orphans })
    }
}
