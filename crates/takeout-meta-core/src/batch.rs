use glob::Pattern;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::classify;
use crate::error::Result;
use crate::matcher::{MatchKind, MatchResult, SidecarMatcher};
use crate::progress::{ProgressReporter, SilentReporter};
use crate::scanner;

/// Cooperative stop flag checked between files.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Summary counts derived from a result sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    pub matched: usize,
    pub unmatched: usize,
    pub by_kind: BTreeMap<MatchKind, usize>,
}

impl MatchStats {
    pub fn from_results(results: &[MatchResult]) -> Self {
        let mut stats = Self::default();
        for result in results {
            if result.is_matched() {
                stats.matched += 1;
            } else {
                stats.unmatched += 1;
            }
            *stats.by_kind.entry(result.kind).or_default() += 1;
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.matched + self.unmatched
    }

    pub fn count(&self, kind: MatchKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Fraction of files with a sidecar; `0.0` for an empty run.
    pub fn match_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.matched as f64 / self.total() as f64
        }
    }
}

/// Walks a tree and matches every media file in traversal order.
#[derive(Debug, Clone)]
pub struct BatchMatcher {
    matcher: SidecarMatcher,
    ignore_patterns: Vec<Pattern>,
}

impl BatchMatcher {
    pub fn new(matcher: SidecarMatcher) -> Self {
        Self {
            matcher,
            ignore_patterns: Vec::new(),
        }
    }

    pub fn with_ignore_patterns(mut self, globs: &[String]) -> Self {
        self.ignore_patterns = scanner::compile_ignore_patterns(globs);
        self
    }

    /// Media files under `root` in traversal order.
    pub fn collect_media(&self, root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
        scanner::walk_files(root, recursive, &self.ignore_patterns, classify::is_media)
    }

    /// Match `files` in order. Stops before the next file once `cancel` is
    /// set; every returned result is complete.
    pub fn match_files(
        &self,
        files: &[PathBuf],
        cancel: &CancelToken,
        reporter: &dyn ProgressReporter,
    ) -> Vec<MatchResult> {
        let total = files.len();
        let mut results = Vec::with_capacity(total);

        for (done, file) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!("Matching cancelled after {} of {} files", done, total);
                break;
            }
            results.push(self.matcher.match_media(file));
            reporter.on_match_progress(done + 1, total);
        }

        results
    }

    pub fn match_all(&self, root: &Path, recursive: bool) -> Result<Vec<MatchResult>> {
        self.match_all_with(root, recursive, &CancelToken::new(), &SilentReporter)
    }

    pub fn match_all_with(
        &self,
        root: &Path,
        recursive: bool,
        cancel: &CancelToken,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<MatchResult>> {
        reporter.on_walk_start();
        let walk_start = Instant::now();
        let media_files = self.collect_media(root, recursive)?;
        reporter.on_walk_complete(media_files.len(), walk_start.elapsed().as_secs_f64());
        info!("Found {} media files to process", media_files.len());

        reporter.on_match_start(media_files.len());
        let match_start = Instant::now();
        let results = self.match_files(&media_files, cancel, reporter);
        let stats = MatchStats::from_results(&results);
        reporter.on_match_complete(&stats, match_start.elapsed().as_secs_f64());

        info!(
            "Matched {}/{} media files with sidecar metadata",
            stats.matched,
            stats.total()
        );

        Ok(results)
    }
}
