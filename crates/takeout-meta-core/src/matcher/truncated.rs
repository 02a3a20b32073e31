//! Matching of sidecars whose names the exporter cut short.
//!
//! The exporter limits the whole sidecar name to a fixed budget, so the
//! media name inside it, the supplemental marker after it, or both can be
//! cut at any character. What survives before `.json` is a prefix of the
//! media file name, optionally followed by a prefix of a marker.

use std::path::PathBuf;

use super::patterns::strip_suffix_ignore_case;
use crate::classify::{file_name_str, SIDECAR_EXTENSION};

/// Remove the trailing `.json` (any case) from a sidecar file name.
pub fn strip_sidecar_extension(name: &str) -> Option<&str> {
    let (stem, ext) = crate::classify::split_name(name);
    if ext.len() > 1 && ext[1..].eq_ignore_ascii_case(SIDECAR_EXTENSION) {
        Some(stem)
    } else {
        None
    }
}

/// Strip the longest non-empty prefix of any marker that `name` ends with.
/// Returns `None` when no marker prefix is present.
pub fn strip_partial_marker<'a>(name: &'a str, markers: &[String]) -> Option<&'a str> {
    let mut best: Option<&'a str> = None;

    for marker in markers {
        let prefix_ends = marker.char_indices().map(|(i, c)| i + c.len_utf8()).rev();
        for end in prefix_ends {
            if let Some(rest) = strip_suffix_ignore_case(name, &marker[..end]) {
                if best.map_or(true, |b| rest.len() < b.len()) {
                    best = Some(rest);
                }
                break;
            }
        }
    }

    best
}

/// Presumed truncated media names encoded in a sidecar file name: the name
/// without a partial marker (when one is present) and the name as is.
/// Empty names are never returned.
pub fn truncated_names<'a>(sidecar_name: &'a str, markers: &[String]) -> Vec<&'a str> {
    let Some(base) = strip_sidecar_extension(sidecar_name) else {
        return Vec::new();
    };

    let mut names = Vec::with_capacity(2);
    if let Some(stripped) = strip_partial_marker(base, markers) {
        names.push(stripped);
    }
    names.push(base);
    names.retain(|n| !n.is_empty());
    names
}

/// Length in chars of the longest truncated name of `sidecar_name` that
/// `media_lower` (already lowercased) starts with.
fn accepted_length(media_lower: &str, sidecar_name: &str, markers: &[String]) -> Option<usize> {
    truncated_names(sidecar_name, markers)
        .into_iter()
        .filter(|name| media_lower.starts_with(name.to_lowercase().as_str()))
        .map(|name| name.chars().count())
        .max()
}

/// Pick the candidate whose truncated name is the longest prefix of
/// `media_name`. Ties keep the earliest candidate. Candidates whose names
/// are not valid UTF-8 are skipped.
pub fn best_truncated_match<'c>(
    media_name: &str,
    candidates: &'c [PathBuf],
    markers: &[String],
) -> Option<&'c PathBuf> {
    let media_lower = media_name.to_lowercase();
    let mut best: Option<(&'c PathBuf, usize)> = None;

    for candidate in candidates {
        let Some(name) = file_name_str(candidate) else {
            continue;
        };
        let Some(len) = accepted_length(&media_lower, name, markers) else {
            continue;
        };
        if best.map_or(true, |(_, best_len)| len > best_len) {
            best = Some((candidate, len));
        }
    }

    best.map(|(candidate, _)| candidate)
}
