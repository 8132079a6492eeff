//! Google Drive URL recognition and canonical download links.

use std::sync::LazyLock;

use regex::Regex;

use super::utils::{compile_static_regex, normalize_comment_url};

const CANONICAL_DOWNLOAD_BASE: &str = "https://drive.google.com/uc";

/// Known Google Drive share-link shapes, tried in order.
static DRIVE_URL_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        compile_static_regex(
            r"(?i)^https?://(?:www\.)?drive\.google\.com/file/d/([A-Za-z0-9_-]+)/view",
        ),
        compile_static_regex(
            r"(?i)^https?://(?:www\.)?drive\.google\.com/open\?id=([A-Za-z0-9_-]+)(?:[&#]|$)",
        ),
        compile_static_regex(
            r"(?i)^https?://(?:www\.)?drive\.google\.com/uc\?id=([A-Za-z0-9_-]+)&export=download",
        ),
    ]
});

/// Extracts the Drive file id from any recognized share-link shape.
#[must_use]
pub fn extract_file_id(url: &str) -> Option<String> {
    let url = normalize_comment_url(url);
    DRIVE_URL_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(&url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|id| !id.is_empty())
    })
}

/// Returns the stable, user-facing download URL for a file id.
///
/// Always uses the `uc?id=…&export=download` form regardless of which shape
/// the link was found in.
#[must_use]
pub fn canonical_download_url(file_id: &str) -> String {
    format!("{CANONICAL_DOWNLOAD_BASE}?id={file_id}&export=download")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_file_id_view_shape() {
        assert_eq!(
            extract_file_id("https://drive.google.com/file/d/1aB-c_D2/view").as_deref(),
            Some("1aB-c_D2")
        );
    }

    #[test]
    fn test_extract_file_id_view_shape_with_sharing_suffix() {
        assert_eq!(
            extract_file_id("https://drive.google.com/file/d/XYZ/view?usp=sharing").as_deref(),
            Some("XYZ")
        );
    }

    #[test]
    fn test_extract_file_id_open_shape() {
        assert_eq!(
            extract_file_id("https://drive.google.com/open?id=OPEN42").as_deref(),
            Some("OPEN42")
        );
    }

    #[test]
    fn test_extract_file_id_open_shape_with_extra_params() {
        for url in [
            "https://drive.google.com/open?id=ABC&usp=sharing",
            "https://drive.google.com/open?id=ABC&authuser=0",
            "https://drive.google.com/open?id=ABC#heading",
        ] {
            assert_eq!(extract_file_id(url).as_deref(), Some("ABC"), "{url}");
        }
        assert!(extract_file_id("https://drive.google.com/open?id=ABC/extra").is_none());
    }

    #[test]
    fn test_extract_file_id_uc_shape() {
        assert_eq!(
            extract_file_id("https://drive.google.com/uc?id=UC99&export=download").as_deref(),
            Some("UC99")
        );
    }

    #[test]
    fn test_extract_file_id_html_escaped_ampersand() {
        assert_eq!(
            extract_file_id("https://drive.google.com/uc?id=UC99&amp;export=download").as_deref(),
            Some("UC99")
        );
    }

    #[test]
    fn test_extract_file_id_case_insensitive_host() {
        assert_eq!(
            extract_file_id("HTTPS://Drive.Google.com/file/d/Id1/view").as_deref(),
            Some("Id1")
        );
    }

    #[test]
    fn test_extract_file_id_rejects_other_shapes() {
        assert!(extract_file_id("https://drive.google.com/drive/folders/abc").is_none());
        assert!(extract_file_id("https://drive.google.com/file/d//view").is_none());
        assert!(extract_file_id("https://docs.google.com/file/d/abc/view").is_none());
        assert!(extract_file_id("https://drive.google.com/open?id=").is_none());
    }

    #[test]
    fn test_canonical_download_url_uses_uc_form() {
        assert_eq!(
            canonical_download_url("ABC123"),
            "https://drive.google.com/uc?id=ABC123&export=download"
        );
    }

    #[test]
    fn test_every_shape_yields_same_canonical_url() {
        let id = "SameFile";
        for url in [
            format!("https://drive.google.com/file/d/{id}/view"),
            format!("https://drive.google.com/open?id={id}"),
            format!("https://drive.google.com/uc?id={id}&export=download"),
        ] {
            let extracted = extract_file_id(&url).unwrap();
            assert_eq!(
                canonical_download_url(&extracted),
                "https://drive.google.com/uc?id=SameFile&export=download"
            );
        }
    }
}
