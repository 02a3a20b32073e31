use std::fs;
use std::path::Path;
use tempfile::tempdir;

use takeout_meta_core::{
    BatchMatcher, CancelToken, Error, MatchKind, MatchStats, ProgressReporter, SidecarMatcher,
    SilentReporter,
};

fn create_album(root: &Path) {
    let nested = root.join("z_nested");
    fs::create_dir_all(&nested).unwrap();

    fs::write(root.join("b.jpg"), "").unwrap();
    fs::write(root.join("b.jpg.json"), "{}").unwrap();
    fs::write(root.join("a.mp4"), "").unwrap();
    fs::write(root.join("notes.txt"), "").unwrap();
    fs::write(root.join("metadata.json"), "{}").unwrap();
    fs::write(nested.join("c.png"), "").unwrap();
    fs::write(nested.join("c.png.supplemental-metadata.json"), "{}").unwrap();
}

fn batch() -> BatchMatcher {
    BatchMatcher::new(SidecarMatcher::default())
}

#[test]
fn test_match_all_in_traversal_order() {
    let dir = tempdir().unwrap();
    create_album(dir.path());

    let results = batch().match_all(dir.path(), true).unwrap();
    let media: Vec<_> = results.iter().map(|r| r.media_path.clone()).collect();

    assert_eq!(
        media,
        vec![
            dir.path().join("a.mp4"),
            dir.path().join("b.jpg"),
            dir.path().join("z_nested").join("c.png"),
        ]
    );
    assert_eq!(results[0].kind, MatchKind::None);
    assert_eq!(results[1].kind, MatchKind::Exact);
    assert_eq!(results[2].kind, MatchKind::Supplemental);
}

#[test]
fn test_non_recursive_skips_subdirectories() {
    let dir = tempdir().unwrap();
    create_album(dir.path());

    let results = batch().match_all(dir.path(), false).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.media_path.parent() == Some(dir.path())));
}

#[test]
fn test_repeat_run_with_fresh_matcher_is_identical() {
    let dir = tempdir().unwrap();
    create_album(dir.path());

    let first = batch().match_all(dir.path(), true).unwrap();
    let second = batch().match_all(dir.path(), true).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_ignore_patterns_prune_directories() {
    let dir = tempdir().unwrap();
    create_album(dir.path());

    let pattern = format!("{}/z_*", dir.path().display());
    let results = batch()
        .with_ignore_patterns(&[pattern])
        .match_all(dir.path(), true)
        .unwrap();
    assert_eq!(results.len(), 2);
}

#[test]
fn test_missing_root_is_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");

    let err = batch().match_all(&missing, true).unwrap_err();
    assert!(matches!(err, Error::RootNotFound(path) if path == missing));
}

#[test]
fn test_cancel_before_start_returns_nothing() {
    let dir = tempdir().unwrap();
    create_album(dir.path());

    let cancel = CancelToken::new();
    cancel.cancel();
    let results = batch()
        .match_all_with(dir.path(), true, &cancel, &SilentReporter)
        .unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_stats_over_batch() {
    let dir = tempdir().unwrap();
    create_album(dir.path());

    let results = batch().match_all(dir.path(), true).unwrap();
    let stats = MatchStats::from_results(&results);
    assert_eq!(stats.total(), 3);
    assert_eq!(stats.matched, 2);
    assert_eq!(stats.unmatched, 1);
    assert_eq!(stats.count(MatchKind::Exact), 1);
    assert_eq!(stats.count(MatchKind::Supplemental), 1);
}

#[test]
fn test_empty_root() {
    let dir = tempdir().unwrap();
    let results = batch().match_all(dir.path(), true).unwrap();
    assert!(results.is_empty());
}

/// Cancels the run once `after` files are done.
struct CancelAfter {
    token: CancelToken,
    after: usize,
}

impl ProgressReporter for CancelAfter {
    fn on_match_progress(&self, files_matched: usize, _total_files: usize) {
        if files_matched >= self.after {
            self.token.cancel();
        }
    }
}

#[test]
fn test_cancel_mid_run_keeps_completed_results() {
    let dir = tempdir().unwrap();
    create_album(dir.path());

    let cancel = CancelToken::new();
    let reporter = CancelAfter {
        token: cancel.clone(),
        after: 1,
    };
    let results = batch()
        .match_all_with(dir.path(), true, &cancel, &reporter)
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].media_path, dir.path().join("a.mp4"));
    assert_eq!(results[0].kind, MatchKind::None);
    assert!(cancel.is_cancelled());
}
