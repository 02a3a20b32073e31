pub mod patterns;
pub mod truncated;

use serde::Serialize;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::classify::split_name;
use crate::error::{Error, Result};
use crate::index::DirectoryIndex;
use patterns::{parse_numbered, strip_any_suffix, EDITED_SUFFIXES, SUPPLEMENTARY_SUFFIXES};

pub const BARE_SUFFIX: &str = ".json";

/// Sidecar suffixes in priority order.
pub const DEFAULT_SIDECAR_SUFFIXES: [&str; 3] = [
    ".json",
    ".supplemental-met.json",
    ".supplemental-metadata.json",
];

/// How a media file was paired with its sidecar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Supplemental,
    Edited,
    Numbered,
    Truncated,
    Supplementary,
    None,
}

impl MatchKind {
    pub const ALL: [MatchKind; 7] = [
        MatchKind::Exact,
        MatchKind::Supplemental,
        MatchKind::Edited,
        MatchKind::Numbered,
        MatchKind::Truncated,
        MatchKind::Supplementary,
        MatchKind::None,
    ];

    pub fn confidence(self) -> f64 {
        match self {
            MatchKind::Exact => 1.0,
            MatchKind::Supplemental => 0.95,
            MatchKind::Edited => 0.9,
            MatchKind::Numbered => 0.85,
            MatchKind::Truncated => 0.8,
            MatchKind::Supplementary => 0.75,
            MatchKind::None => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Supplemental => "supplemental",
            MatchKind::Edited => "edited",
            MatchKind::Numbered => "numbered",
            MatchKind::Truncated => "truncated",
            MatchKind::Supplementary => "supplementary",
            MatchKind::None => "none",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of matching one media file. `sidecar_path` is `None` exactly
/// when `kind` is [`MatchKind::None`] and `confidence` is `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub media_path: PathBuf,
    pub sidecar_path: Option<PathBuf>,
    pub kind: MatchKind,
    pub confidence: f64,
}

impl MatchResult {
    fn matched(media_path: &Path, sidecar_path: PathBuf, kind: MatchKind) -> Self {
        debug_assert!(kind != MatchKind::None);
        Self {
            media_path: media_path.to_path_buf(),
            sidecar_path: Some(sidecar_path),
            kind,
            confidence: kind.confidence(),
        }
    }

    pub fn unmatched(media_path: &Path) -> Self {
        Self {
            media_path: media_path.to_path_buf(),
            sidecar_path: None,
            kind: MatchKind::None,
            confidence: 0.0,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.sidecar_path.is_some()
    }
}

/// Ordered suffixes appended to a media file name to form its sidecar name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarSuffixSet {
    suffixes: Vec<String>,
    markers: Vec<String>,
}

impl Default for SidecarSuffixSet {
    fn default() -> Self {
        Self::from_valid(DEFAULT_SIDECAR_SUFFIXES.iter().map(|s| s.to_string()).collect())
    }
}

impl SidecarSuffixSet {
    /// Every suffix must end in `.json`; the set must not be empty.
    pub fn new<I, S>(suffixes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let suffixes: Vec<String> = suffixes.into_iter().map(Into::into).collect();
        if suffixes.is_empty() {
            return Err(Error::InvalidSuffix("suffix set is empty".to_string()));
        }
        for suffix in &suffixes {
            let ends_with_json = suffix.len() >= BARE_SUFFIX.len()
                && suffix.is_char_boundary(suffix.len() - BARE_SUFFIX.len())
                && suffix[suffix.len() - BARE_SUFFIX.len()..].eq_ignore_ascii_case(BARE_SUFFIX);
            if !ends_with_json {
                return Err(Error::InvalidSuffix(suffix.clone()));
            }
        }
        Ok(Self::from_valid(suffixes))
    }

    fn from_valid(suffixes: Vec<String>) -> Self {
        let markers = suffixes
            .iter()
            .filter(|s| !Self::is_bare(s))
            .map(|s| s[..s.len() - BARE_SUFFIX.len()].to_string())
            .collect();
        Self { suffixes, markers }
    }

    pub fn is_bare(suffix: &str) -> bool {
        suffix.eq_ignore_ascii_case(BARE_SUFFIX)
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Non-bare suffixes without their trailing `.json`, e.g.
    /// `.supplemental-metadata`.
    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

/// Resolves a media file to the sidecar that describes it.
///
/// Strategies run in a fixed order and the first one that finds an existing
/// sidecar wins:
///
/// 1. exact name plus suffix (`Exact` / `Supplemental`)
/// 2. locale specific edited copy of an original (`Edited`)
/// 3. numbered duplicate `name(n).ext` (`Numbered`)
/// 4. sidecar name cut short by the exporter (`Truncated`)
/// 5. derived media such as `-EFFECTS` or `-COLLAGE` (`Supplementary`)
///
/// The matcher holds no counters; aggregate results with
/// [`crate::batch::MatchStats`].
#[derive(Debug, Clone)]
pub struct SidecarMatcher {
    suffixes: SidecarSuffixSet,
    index: Arc<DirectoryIndex>,
}

impl Default for SidecarMatcher {
    fn default() -> Self {
        Self::new(SidecarSuffixSet::default())
    }
}

impl SidecarMatcher {
    pub fn new(suffixes: SidecarSuffixSet) -> Self {
        Self::with_index(suffixes, Arc::new(DirectoryIndex::new()))
    }

    pub fn with_index(suffixes: SidecarSuffixSet, index: Arc<DirectoryIndex>) -> Self {
        Self { suffixes, index }
    }

    pub fn suffixes(&self) -> &SidecarSuffixSet {
        &self.suffixes
    }

    pub fn match_media(&self, media_path: &Path) -> MatchResult {
        let directory = parent_dir(media_path);
        let Some(file_name) = media_path.file_name() else {
            debug!("No file name, nothing to match: {}", media_path.display());
            return MatchResult::unmatched(media_path);
        };

        if let Some((sidecar, bare)) = self.try_suffixes(&directory, file_name) {
            let kind = if bare { MatchKind::Exact } else { MatchKind::Supplemental };
            return self.hit(media_path, sidecar, kind);
        }

        // Name patterns only apply to names that are valid UTF-8.
        let Some(filename) = file_name.to_str() else {
            debug!("No sidecar match found for non UTF-8 name: {}", media_path.display());
            return MatchResult::unmatched(media_path);
        };

        if let Some(sidecar) = self.try_edited(&directory, filename) {
            return self.hit(media_path, sidecar, MatchKind::Edited);
        }

        if let Some(sidecar) = self.try_numbered(&directory, filename) {
            return self.hit(media_path, sidecar, MatchKind::Numbered);
        }

        if let Some(sidecar) = self.try_truncated(&directory, filename) {
            return self.hit(media_path, sidecar, MatchKind::Truncated);
        }

        if let Some(sidecar) = self.try_supplementary(&directory, filename) {
            return self.hit(media_path, sidecar, MatchKind::Supplementary);
        }

        debug!("No sidecar match found for: {}", media_path.display());
        MatchResult::unmatched(media_path)
    }

    fn hit(&self, media_path: &Path, sidecar: PathBuf, kind: MatchKind) -> MatchResult {
        trace!("{} -> {} ({})", media_path.display(), sidecar.display(), kind);
        MatchResult::matched(media_path, sidecar, kind)
    }

    /// `directory/(file_name + suffix)` for each suffix in order, each
    /// spelled as configured and then with an upper case `.JSON`. The name
    /// is extended as an `OsStr`, so names that are not UTF-8 keep their
    /// exact bytes. The flag reports whether the bare suffix matched.
    fn try_suffixes(&self, directory: &Path, file_name: &OsStr) -> Option<(PathBuf, bool)> {
        self.suffixes.suffixes().iter().find_map(|suffix| {
            spellings(suffix).find_map(|spelling| {
                let mut sidecar_name = file_name.to_os_string();
                sidecar_name.push(&spelling);
                let candidate = directory.join(sidecar_name);
                candidate
                    .is_file()
                    .then(|| (candidate, SidecarSuffixSet::is_bare(suffix)))
            })
        })
    }

    fn try_edited(&self, directory: &Path, filename: &str) -> Option<PathBuf> {
        let (stem, ext) = split_name(filename);
        let (original_stem, _) = strip_any_suffix(stem, EDITED_SUFFIXES)?;
        let original = format!("{}{}", original_stem, ext);
        self.try_suffixes(directory, OsStr::new(&original))
            .map(|(sidecar, _)| sidecar)
    }

    fn try_numbered(&self, directory: &Path, filename: &str) -> Option<PathBuf> {
        let numbered = parse_numbered(filename)?;
        let (base, number, ext) = (numbered.base, numbered.number, numbered.ext);

        for suffix in self.suffixes.suffixes() {
            let mut candidates = vec![
                format!("{}{}{}{}", base, number, ext, suffix),
                format!("{}{}{}{}", base, ext, number, suffix),
            ];
            if !SidecarSuffixSet::is_bare(suffix) {
                let marker = &suffix[..suffix.len() - BARE_SUFFIX.len()];
                candidates.push(format!("{}{}{}{}{}", base, ext, marker, number, BARE_SUFFIX));
            }
            candidates.push(format!("{}{}{}", base, ext, suffix));

            let found = candidates
                .into_iter()
                .map(|name| directory.join(name))
                .find(|candidate| candidate.is_file());
            if found.is_some() {
                return found;
            }
        }

        None
    }

    fn try_truncated(&self, directory: &Path, filename: &str) -> Option<PathBuf> {
        let candidates = self.index.list_sidecars(directory);
        truncated::best_truncated_match(filename, &candidates, self.suffixes.markers()).cloned()
    }

    fn try_supplementary(&self, directory: &Path, filename: &str) -> Option<PathBuf> {
        let (stem, ext) = split_name(filename);
        let (original_stem, _) = strip_any_suffix(stem, SUPPLEMENTARY_SUFFIXES)?;
        let original = format!("{}{}", original_stem, ext);

        if let Some((sidecar, _)) = self.try_suffixes(directory, OsStr::new(&original)) {
            return Some(sidecar);
        }
        self.try_truncated(directory, &original)
    }
}

/// `suffix` as configured, then with its `.json` extension upper cased
/// when that spells it differently.
fn spellings(suffix: &str) -> impl Iterator<Item = String> {
    let marker = &suffix[..suffix.len() - BARE_SUFFIX.len()];
    let upper = format!("{}{}", marker, BARE_SUFFIX.to_uppercase());
    let upper = (upper != suffix).then_some(upper);
    std::iter::once(suffix.to_string()).chain(upper)
}

/// Directory holding `path`; a bare file name lives in `.`.
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
