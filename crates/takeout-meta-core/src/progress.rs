use crate::batch::MatchStats;

/// Trait for reporting run progress.
///
/// CLI implements with indicatif progress bars; library callers usually pass
/// [`SilentReporter`]. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_walk_start(&self) {}
    fn on_walk_complete(&self, _media_files: usize, _duration_secs: f64) {}
    fn on_match_start(&self, _total_files: usize) {}
    fn on_match_progress(&self, _files_matched: usize, _total_files: usize) {}
    fn on_match_complete(&self, _stats: &MatchStats, _duration_secs: f64) {}
    fn on_orphan_scan_start(&self) {}
    fn on_orphan_scan_complete(&self, _orphans: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
