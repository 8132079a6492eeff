//! Filename sanitization and suffix checks for provider downloads.

use std::path::{Component, Path};

use super::constants::ACCEPTED_EXTENSIONS;

/// Sanitizes a provider-reported filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Returns true when `name` ends in one of the accepted archive suffixes.
#[must_use]
pub fn has_accepted_extension(name: &str) -> bool {
    ACCEPTED_EXTENSIONS
        .iter()
        .any(|ext| ends_with_ignore_ascii_case(name, ext))
}

/// Returns true when an extracted member looks like a configuration document.
#[must_use]
pub fn is_xml_member(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| ends_with_ignore_ascii_case(name, ".xml"))
}

fn ends_with_ignore_ascii_case(name: &str, suffix: &str) -> bool {
    name.len() > suffix.len()
        && name
            .get(name.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_removes_invalid_chars() {
        assert_eq!(sanitize_filename("a/b.zip"), "a_b.zip");
        assert_eq!(sanitize_filename("a\\b.zip"), "a_b.zip");
        assert_eq!(sanitize_filename("a:b*c?.zip"), "a_b_c_.zip");
        assert_eq!(sanitize_filename("wave<1>|2.ChromaEffects"), "wave_1__2.ChromaEffects");
    }

    #[test]
    fn test_sanitize_filename_rewrites_dot_segments() {
        assert_eq!(sanitize_filename("."), "_");
        assert_eq!(sanitize_filename(".."), "__");
        assert_eq!(sanitize_filename("   "), "_");
    }

    #[test]
    fn test_sanitize_filename_preserves_valid_chars() {
        assert_eq!(sanitize_filename("Neon Wave (v2).zip"), "Neon Wave (v2).zip");
        assert_eq!(sanitize_filename("日本語.ChromaEffects"), "日本語.ChromaEffects");
    }

    #[test]
    fn test_has_accepted_extension() {
        assert!(has_accepted_extension("profile.ChromaEffects"));
        assert!(has_accepted_extension("profile.zip"));
        assert!(has_accepted_extension("PROFILE.ZIP"));
        assert!(has_accepted_extension("profile.chromaeffects"));
    }

    #[test]
    fn test_has_accepted_extension_rejects_others() {
        assert!(!has_accepted_extension("profile.rar"));
        assert!(!has_accepted_extension("profile.zip.txt"));
        assert!(!has_accepted_extension("zip"));
        assert!(!has_accepted_extension(".zip"));
        assert!(!has_accepted_extension(""));
    }

    #[test]
    fn test_is_xml_member() {
        assert!(is_xml_member(Path::new("a/b/Effects.xml")));
        assert!(is_xml_member(Path::new("LAYER.XML")));
        assert!(!is_xml_member(Path::new("readme.txt")));
        assert!(!is_xml_member(Path::new("xml")));
    }
}
