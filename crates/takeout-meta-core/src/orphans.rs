use glob::Pattern;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::classify::{
    self, fold_name, is_media_extension, is_partial_media_extension, split_name, utf8_tail_start,
};
use crate::config::DEFAULT_TRUNCATION_BUDGET;
use crate::error::Result;
use crate::index::DirectoryIndex;
use crate::matcher::patterns::{split_trailing_number, strip_suffix_ignore_case};
use crate::matcher::truncated::{strip_partial_marker, strip_sidecar_extension};
use crate::matcher::{parent_dir, SidecarMatcher, SidecarSuffixSet};
use crate::progress::{ProgressReporter, SilentReporter};
use crate::scanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    /// Complete media name in front of a known suffix.
    Exact,
    /// Numbered duplicate, rebuilt as `stem(n).ext`.
    Numbered,
    /// Leading part of a media name cut short by the exporter.
    Truncated,
}

/// Stands in for the bytes of a name that precede its valid UTF-8 tail.
const RAW_HEAD: &str = "\u{FFFD}";

/// Media name a sidecar file name points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedName {
    pub name: String,
    pub style: NameStyle,
}

impl DerivedName {
    fn new(name: impl Into<String>, style: NameStyle) -> Self {
        Self {
            name: name.into(),
            style,
        }
    }
}

/// Finds sidecars that no media file in their directory refers to.
#[derive(Debug, Clone)]
pub struct OrphanDetector {
    matcher: SidecarMatcher,
    truncation_budget: usize,
    ignore_patterns: Vec<Pattern>,
}

impl Default for OrphanDetector {
    fn default() -> Self {
        Self::new(SidecarSuffixSet::default(), DEFAULT_TRUNCATION_BUDGET)
    }
}

impl OrphanDetector {
    pub fn new(suffixes: SidecarSuffixSet, truncation_budget: usize) -> Self {
        Self::with_index(suffixes, truncation_budget, Arc::new(DirectoryIndex::new()))
    }

    pub fn with_index(
        suffixes: SidecarSuffixSet,
        truncation_budget: usize,
        index: Arc<DirectoryIndex>,
    ) -> Self {
        Self {
            matcher: SidecarMatcher::with_index(suffixes, index),
            truncation_budget,
            ignore_patterns: Vec::new(),
        }
    }

    pub fn with_ignore_patterns(mut self, globs: &[String]) -> Self {
        self.ignore_patterns = scanner::compile_ignore_patterns(globs);
        self
    }

    /// Recover the media name a sidecar file name refers to. `None` means
    /// the file is not a media sidecar at all (album `metadata.json` and
    /// similar), and such files are never reported.
    pub fn derive_media_name(&self, sidecar_name: &str) -> Option<DerivedName> {
        let suffix_set = self.matcher.suffixes();

        let mut suffixes: Vec<&String> = suffix_set.suffixes().iter().collect();
        suffixes.sort_by_key(|s| Reverse(s.len()));

        for suffix in suffixes {
            let Some(rest) = strip_suffix_ignore_case(sidecar_name, suffix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let (_, ext) = split_name(rest);
            if is_media_extension(ext) {
                return Some(DerivedName::new(rest, NameStyle::Exact));
            }
            if let Some(numbered) = numbered_media_name(rest, suffix_set.markers()) {
                return Some(DerivedName::new(numbered, NameStyle::Numbered));
            }
        }

        let base = strip_sidecar_extension(sidecar_name)?;
        let stripped = strip_partial_marker(base, suffix_set.markers());
        let derived = stripped.unwrap_or(base);
        if derived.is_empty() {
            return None;
        }

        let (_, ext) = split_name(derived);
        let recognized = stripped.is_some()
            || is_partial_media_extension(ext)
            || base.chars().count() + 1 >= self.truncation_budget;

        recognized.then(|| DerivedName::new(derived, NameStyle::Truncated))
    }

    /// [`Self::derive_media_name`] for a name as stored on disk, returning
    /// the derived name's bytes. A name that is not valid UTF-8 is derived
    /// from its valid tail and keeps the raw bytes before it unchanged.
    fn derive_file_name(&self, file_name: &OsStr) -> Option<(Vec<u8>, NameStyle)> {
        if let Some(name) = file_name.to_str() {
            return self
                .derive_media_name(name)
                .map(|derived| (derived.name.into_bytes(), derived.style));
        }

        let bytes = file_name.as_encoded_bytes();
        let start = utf8_tail_start(bytes);
        let tail = std::str::from_utf8(&bytes[start..]).ok()?;
        let derived = self.derive_media_name(&format!("{}{}", RAW_HEAD, tail))?;
        let rest = derived.name.strip_prefix(RAW_HEAD)?;

        let mut name = bytes[..start].to_vec();
        name.extend_from_slice(rest.as_bytes());
        Some((name, derived.style))
    }

    pub fn find_orphans(&self, root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
        self.find_orphans_with(root, recursive, &SilentReporter)
    }

    pub fn find_orphans_with(
        &self,
        root: &Path,
        recursive: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<PathBuf>> {
        reporter.on_orphan_scan_start();
        let start = Instant::now();

        let sidecars =
            scanner::walk_files(root, recursive, &self.ignore_patterns, classify::is_sidecar)?;

        let mut directories: HashMap<PathBuf, Option<Siblings>> = HashMap::new();
        let mut orphans = Vec::new();

        for sidecar in sidecars {
            let derived = sidecar
                .file_name()
                .and_then(|name| self.derive_file_name(name));
            let Some((derived, style)) = derived else {
                trace!("Not a media sidecar: {}", sidecar.display());
                continue;
            };

            let dir = parent_dir(&sidecar);
            let siblings = directories
                .entry(dir.clone())
                .or_insert_with(|| Siblings::read(&dir));
            let Some(siblings) = siblings.as_mut() else {
                continue;
            };

            if siblings.has_media_with_prefix(&derived) {
                continue;
            }
            if siblings.claimed(&self.matcher).contains(&sidecar) {
                continue;
            }

            debug!("Orphaned {:?} sidecar: {}", style, sidecar.display());
            orphans.push(sidecar);
        }

        reporter.on_orphan_scan_complete(orphans.len(), start.elapsed().as_secs_f64());
        info!("Found {} orphaned sidecar files", orphans.len());
        Ok(orphans)
    }
}

/// `stem.ext(n)` or `stem.ext<marker>(n)` rebuilt as `stem(n).ext`.
fn numbered_media_name(rest: &str, markers: &[String]) -> Option<String> {
    let (head, number) = split_trailing_number(rest)?;

    let media = std::iter::once(head)
        .chain(
            markers
                .iter()
                .filter_map(|marker| strip_suffix_ignore_case(head, marker)),
        )
        .find(|candidate| is_media_extension(split_name(candidate).1))?;

    let (stem, ext) = split_name(media);
    if stem.is_empty() {
        return None;
    }
    Some(format!("{}{}{}", stem, number, ext))
}

/// Media files of one directory, and the sidecars the forward matcher
/// assigns to them (computed on first need).
struct Siblings {
    media: Vec<PathBuf>,
    media_folded: Vec<Vec<u8>>,
    claimed: Option<HashSet<PathBuf>>,
}

impl Siblings {
    fn read(dir: &Path) -> Option<Self> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "Error listing directory {}, skipping its sidecars: {}",
                    dir.display(),
                    err
                );
                return None;
            }
        };

        let mut media: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| classify::is_media(path) && path.is_file())
            .collect();
        media.sort();

        let media_folded = media
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| fold_name(name.as_encoded_bytes()))
            .collect();

        Some(Self {
            media,
            media_folded,
            claimed: None,
        })
    }

    /// Compared on case-folded bytes, never on lossy strings.
    fn has_media_with_prefix(&self, derived: &[u8]) -> bool {
        let derived = fold_name(derived);
        self.media_folded.iter().any(|name| name.starts_with(&derived))
    }

    fn claimed(&mut self, matcher: &SidecarMatcher) -> &HashSet<PathBuf> {
        let media = &self.media;
        self.claimed.get_or_insert_with(|| {
            media
                .iter()
                .filter_map(|path| matcher.match_media(path).sidecar_path)
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(name: &str) -> Option<DerivedName> {
        OrphanDetector::default().derive_media_name(name)
    }

    #[test]
    fn test_derive_exact() {
        assert_eq!(
            derive("photo.jpg.json"),
            Some(DerivedName::new("photo.jpg", NameStyle::Exact))
        );
        assert_eq!(
            derive("photo.jpg.supplemental-metadata.json"),
            Some(DerivedName::new("photo.jpg", NameStyle::Exact))
        );
        assert_eq!(
            derive("clip.MP4.supplemental-met.json"),
            Some(DerivedName::new("clip.MP4", NameStyle::Exact))
        );
    }

    #[test]
    fn test_derive_numbered() {
        assert_eq!(
            derive("photo.jpg(1).json"),
            Some(DerivedName::new("photo(1).jpg", NameStyle::Numbered))
        );
        assert_eq!(
            derive("photo.jpg.supplemental-metadata(2).json"),
            Some(DerivedName::new("photo(2).jpg", NameStyle::Numbered))
        );
    }

    #[test]
    fn test_derive_truncated() {
        assert_eq!(
            derive("photo.jpg.supplem.json"),
            Some(DerivedName::new("photo.jpg", NameStyle::Truncated))
        );
        assert_eq!(derive("photo.j.json"), Some(DerivedName::new("photo.j", NameStyle::Truncated)));
        assert_eq!(
            derive("Screenshot_20210608-182630_Samsung Experience .json"),
            Some(DerivedName::new(
                "Screenshot_20210608-182630_Samsung Experience ",
                NameStyle::Truncated
            ))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_derive_keeps_raw_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let detector = OrphanDetector::default();
        let derived = detector.derive_file_name(OsStr::from_bytes(b"a\xfe.jpg.json"));
        assert_eq!(derived, Some((b"a\xfe.jpg".to_vec(), NameStyle::Exact)));

        let numbered = detector.derive_file_name(OsStr::from_bytes(b"\xff.jpg(1).json"));
        assert_eq!(numbered, Some((b"\xff(1).jpg".to_vec(), NameStyle::Numbered)));

        assert_eq!(detector.derive_file_name(OsStr::from_bytes(b"\xff.json")), None);
    }

    #[test]
    fn test_derive_rejects_non_sidecars() {
        assert_eq!(derive("metadata.json"), None);
        assert_eq!(derive("print-subscriptions.json"), None);
        assert_eq!(derive(".json"), None);
        assert_eq!(derive("photo.jpg"), None);
    }
}
