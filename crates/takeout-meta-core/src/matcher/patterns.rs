//! Name pattern tables used by the matching strategies.
//!
//! Everything here is plain data plus total string functions, so it can be
//! tested without a filesystem.

/// Trailing stem tokens the exporter appends to locally edited copies, one
/// or more per locale.
pub const EDITED_SUFFIXES: &[&str] = &[
    "-edited",
    "-bearbeitet",
    "-bewerkt",
    "-edytowane",
    "-modifié",
    "-modificato",
    "-editado",
    "-ha editado",
    "-editat",
    "-編集済み",
];

/// Trailing stem tokens of media derived from an original (effects,
/// animations, collages, panoramas, motion stills).
pub const SUPPLEMENTARY_SUFFIXES: &[&str] = &[
    "-EFFECTS",
    "-ANIMATION",
    "-COLLAGE",
    "-PANO",
    "-MOTION",
    "-SMILE",
    "-MIX",
];

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Case-insensitive `str::strip_suffix`, compared one char at a time so the
/// returned slice always ends on a char boundary of `s`.
pub fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let mut rest = s.char_indices().rev();
    let mut end = s.len();

    for expected in suffix.chars().rev() {
        let (idx, actual) = rest.next()?;
        if !chars_eq_ignore_case(actual, expected) {
            return None;
        }
        end = idx;
    }

    Some(&s[..end])
}

/// Strip the first token of `table` that `stem` ends with. The remaining
/// stem must not be empty.
pub fn strip_any_suffix<'a>(
    stem: &'a str,
    table: &[&'static str],
) -> Option<(&'a str, &'static str)> {
    table.iter().find_map(|token| {
        strip_suffix_ignore_case(stem, token)
            .filter(|original| !original.is_empty())
            .map(|original| (original, *token))
    })
}

/// Split a trailing `(digits)` group off `s`: `"photo(12)"` gives
/// `("photo", "(12)")`. The part before the group may be empty.
pub fn split_trailing_number(s: &str) -> Option<(&str, &str)> {
    let inner = s.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let digits = &inner[open + 1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.split_at(open))
}

/// A numbered duplicate name `base(n).ext`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberedName<'a> {
    pub base: &'a str,
    /// The group including its parentheses, e.g. `(1)`.
    pub number: &'a str,
    /// The extension including its leading dot.
    pub ext: &'a str,
}

/// Parse `base(n).ext` where `base` is non-empty and `ext` has no dots.
pub fn parse_numbered(name: &str) -> Option<NumberedName<'_>> {
    let dot = name.rfind('.')?;
    let (head, ext) = name.split_at(dot);
    if ext.len() < 2 {
        return None;
    }

    let (base, number) = split_trailing_number(head)?;
    if base.is_empty() {
        return None;
    }

    Some(NumberedName { base, number, ext })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_suffix_ignore_case() {
        assert_eq!(strip_suffix_ignore_case("trip-EDITED", "-edited"), Some("trip"));
        assert_eq!(strip_suffix_ignore_case("trip-edited", "-edited"), Some("trip"));
        assert_eq!(strip_suffix_ignore_case("trip", "-edited"), None);
        assert_eq!(strip_suffix_ignore_case("ed", "-edited"), None);
        assert_eq!(strip_suffix_ignore_case("photo", ""), Some("photo"));
    }

    #[test]
    fn test_strip_suffix_unicode() {
        assert_eq!(strip_suffix_ignore_case("été-MODIFIÉ", "-modifié"), Some("été"));
        assert_eq!(strip_suffix_ignore_case("写真-編集済み", "-編集済み"), Some("写真"));
        assert_eq!(strip_suffix_ignore_case("写真", "-編集済み"), None);
    }

    #[test]
    fn test_strip_any_suffix_requires_remaining_stem() {
        assert_eq!(strip_any_suffix("-edited", EDITED_SUFFIXES), None);
        assert_eq!(
            strip_any_suffix("IMG_0001-Bearbeitet", EDITED_SUFFIXES),
            Some(("IMG_0001", "-bearbeitet"))
        );
        assert_eq!(
            strip_any_suffix("IMG_0001-collage", SUPPLEMENTARY_SUFFIXES),
            Some(("IMG_0001", "-COLLAGE"))
        );
    }

    #[test]
    fn test_parse_numbered() {
        assert_eq!(
            parse_numbered("photo(1).jpg"),
            Some(NumberedName { base: "photo", number: "(1)", ext: ".jpg" })
        );
        assert_eq!(
            parse_numbered("a(1)(2).jpg"),
            Some(NumberedName { base: "a(1)", number: "(2)", ext: ".jpg" })
        );
        assert_eq!(parse_numbered("(1).jpg"), None);
        assert_eq!(parse_numbered("photo(x).jpg"), None);
        assert_eq!(parse_numbered("photo().jpg"), None);
        assert_eq!(parse_numbered("photo(1)."), None);
        assert_eq!(parse_numbered("photo(1)"), None);
        assert_eq!(parse_numbered("photo(1).tar.gz"), None);
    }

    #[test]
    fn test_split_trailing_number() {
        assert_eq!(split_trailing_number("photo.jpg(3)"), Some(("photo.jpg", "(3)")));
        assert_eq!(split_trailing_number("photo.jpg"), None);
        assert_eq!(split_trailing_number("(7)"), Some(("", "(7)")));
    }
}
