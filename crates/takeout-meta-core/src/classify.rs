// Filename classification for export trees

use std::ffi::OsStr;
use std::path::Path;

pub const SIDECAR_EXTENSION: &str = "json";

// Raw formats first, then common formats.
pub const IMAGE_EXTENSIONS: [&str; 19] = [
    "raw", "cr2", "nef", "arw", "dng", "orf", "rw2", "pef", "srw",
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "heic", "heif",
];

pub const VIDEO_EXTENSIONS: [&str; 14] = [
    "mp4", "mov", "avi", "mkv", "wmv", "flv", "webm", "m4v", "3gp", "3g2",
    "mts", "m2ts", "mpg", "mpeg",
];

fn lower_extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Check if a file is an image based on extension
pub fn is_image(path: &Path) -> bool {
    match lower_extension(path) {
        Some(ext) => IMAGE_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// Check if a file is a video based on extension
pub fn is_video(path: &Path) -> bool {
    match lower_extension(path) {
        Some(ext) => VIDEO_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

pub fn is_media(path: &Path) -> bool {
    is_image(path) || is_video(path)
}

/// Check if a file has the sidecar extension
pub fn is_sidecar(path: &Path) -> bool {
    lower_extension(path).as_deref() == Some(SIDECAR_EXTENSION)
}

/// Same as [`is_media`] for a bare extension, with or without the leading dot.
pub fn is_media_extension(ext: &str) -> bool {
    let ext = ext.trim_start_matches('.').to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str())
}

/// True when `ext` is a non-empty, case-insensitive prefix of a media
/// extension, e.g. `.j` or `.jpe` left behind by a truncated export name.
pub fn is_partial_media_extension(ext: &str) -> bool {
    let ext = ext.trim_start_matches('.').to_lowercase();
    if ext.is_empty() {
        return false;
    }
    IMAGE_EXTENSIONS
        .iter()
        .chain(VIDEO_EXTENSIONS.iter())
        .any(|known| known.starts_with(ext.as_str()))
}

/// Split a file name into `(stem, extension)` where the extension keeps its
/// leading dot. A leading dot alone does not start an extension.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// File name of a path when it is valid UTF-8.
pub fn file_name_str(path: &Path) -> Option<&str> {
    path.file_name().and_then(OsStr::to_str)
}

/// Case-folded bytes of a file name for prefix comparison. Valid UTF-8 is
/// lowercased in full; anything else only has its ASCII letters folded, so
/// distinct invalid byte sequences never compare equal.
pub fn fold_name(bytes: &[u8]) -> Vec<u8> {
    match std::str::from_utf8(bytes) {
        Ok(name) => name.to_lowercase().into_bytes(),
        Err(_) => bytes.to_ascii_lowercase(),
    }
}

/// Offset where the longest valid UTF-8 tail of `bytes` starts, i.e. just
/// past the last invalid sequence. `0` for valid UTF-8.
pub fn utf8_tail_start(bytes: &[u8]) -> usize {
    let mut start = 0;
    while let Err(err) = std::str::from_utf8(&bytes[start..]) {
        match err.error_len() {
            Some(len) => start += err.valid_up_to() + len,
            None => return bytes.len(),
        }
    }
    start
}
