use std::fs;
use std::path::Path;
use tempfile::tempdir;

use takeout_meta_core::{
    AppConfig, CancelToken, MatchKind, ProgressReporter, SilentReporter, TakeoutEngine,
};

fn create_tree(root: &Path) {
    let album_a = root.join("album_a");
    let album_b = root.join("album_b");
    fs::create_dir_all(&album_a).unwrap();
    fs::create_dir_all(&album_b).unwrap();

    fs::write(album_a.join("photo.jpg"), "").unwrap();
    fs::write(album_a.join("photo.jpg.json"), "{}").unwrap();
    fs::write(album_a.join("stale.jpg.json"), "{}").unwrap();

    fs::write(album_b.join("clip.mp4"), "").unwrap();
    fs::write(album_b.join("IMG_0001-edited.jpg"), "").unwrap();
    fs::write(album_b.join("IMG_0001.jpg.json"), "{}").unwrap();
}

fn config_for(roots: &[&Path]) -> AppConfig {
    AppConfig {
        root_paths: roots.iter().map(|p| p.to_string_lossy().into_owned()).collect(),
        ..AppConfig::default()
    }
}

#[test]
fn test_run_match_over_multiple_roots() {
    let dir = tempdir().unwrap();
    create_tree(dir.path());
    let album_a = dir.path().join("album_a");
    let album_b = dir.path().join("album_b");

    let engine = TakeoutEngine::new(config_for(&[&album_b, &album_a]));
    let run = engine.run_match(&SilentReporter, &CancelToken::new()).unwrap();

    let media: Vec<_> = run.results.iter().map(|r| r.media_path.clone()).collect();
    assert_eq!(
        media,
        vec![
            album_b.join("IMG_0001-edited.jpg"),
            album_b.join("clip.mp4"),
            album_a.join("photo.jpg"),
        ]
    );
    assert_eq!(run.results[0].kind, MatchKind::Edited);
    assert_eq!(run.stats.matched, 2);
    assert_eq!(run.stats.unmatched, 1);
    assert!(!run.cancelled);
}

#[test]
fn test_overlapping_roots_are_processed_once() {
    let dir = tempdir().unwrap();
    create_tree(dir.path());
    let album_a = dir.path().join("album_a");

    let engine = TakeoutEngine::new(config_for(&[dir.path(), &album_a]));
    let run = engine.run_match(&SilentReporter, &CancelToken::new()).unwrap();
    assert_eq!(run.stats.total(), 3);
}

#[test]
fn test_run_match_cancelled() {
    let dir = tempdir().unwrap();
    create_tree(dir.path());

    let cancel = CancelToken::new();
    cancel.cancel();
    let engine = TakeoutEngine::new(config_for(&[dir.path()]));
    let run = engine.run_match(&SilentReporter, &cancel).unwrap();

    assert!(run.cancelled);
    assert!(run.results.is_empty());
}

#[test]
fn test_run_without_roots_fails() {
    let engine = TakeoutEngine::new(AppConfig::default());
    assert!(engine.run_match(&SilentReporter, &CancelToken::new()).is_err());
    assert!(engine.run_orphans(&SilentReporter).is_err());
}

#[test]
fn test_invalid_suffix_config_fails() {
    let dir = tempdir().unwrap();
    let config = AppConfig {
        sidecar_suffixes: vec![".xmp".to_string()],
        ..config_for(&[dir.path()])
    };
    let engine = TakeoutEngine::new(config);
    assert!(engine.run_match(&SilentReporter, &CancelToken::new()).is_err());
}

#[test]
fn test_run_orphans() {
    let dir = tempdir().unwrap();
    create_tree(dir.path());

    let engine = TakeoutEngine::new(config_for(&[dir.path()]));
    let run = engine.run_orphans(&SilentReporter).unwrap();
    assert_eq!(run.orphans, vec![dir.path().join("album_a").join("stale.jpg.json")]);
}

struct CancelAfterFirst(CancelToken);

impl ProgressReporter for CancelAfterFirst {
    fn on_match_progress(&self, _files_matched: usize, _total_files: usize) {
        self.0.cancel();
    }
}

#[test]
fn test_run_match_cancelled_mid_run() {
    let dir = tempdir().unwrap();
    create_tree(dir.path());
    let album_b = dir.path().join("album_b");

    let cancel = CancelToken::new();
    let engine = TakeoutEngine::new(config_for(&[&album_b]));
    let run = engine
        .run_match(&CancelAfterFirst(cancel.clone()), &cancel)
        .unwrap();

    assert!(run.cancelled);
    assert_eq!(run.results.len(), 1);
    assert_eq!(run.results[0].media_path, album_b.join("IMG_0001-edited.jpg"));
    assert_eq!(run.results[0].kind, MatchKind::Edited);
    assert_eq!(run.stats.total(), 1);
}
