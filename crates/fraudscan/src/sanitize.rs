//! Helpers for sanitizing data before it enters log events or the filesystem.
//!
//! Uploaded identity documents are sensitive. Log lines carry file names and
//! truncated program output only, never full storage paths or file bytes.

use std::path::Path;

/// Returns only the filename component of a path, for span fields.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Redacts a subprocess argument for logging.
///
/// Arguments that look like filesystem paths are reduced to their file name;
/// everything else is truncated.
pub fn redact_arg(arg: &str, max_chars: usize) -> String {
    if arg.contains('/') || arg.contains('\\') {
        redact_path(Path::new(arg))
    } else {
        truncate_for_log(arg, max_chars)
    }
}

/// Truncates text to at most `max_chars` characters, appending a marker with
/// the number of characters dropped. Never splits a UTF-8 code point.
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }

    let kept: String = text.chars().take(max_chars).collect();
    format!("{}… [{} more chars]", kept, total - max_chars)
}

/// Reduces an uploaded file name to a safe single path component.
///
/// Directory parts are discarded and characters outside
/// `[A-Za-z0-9._-]` are replaced with `_`. Returns `None` when nothing
/// usable remains (empty, dots only).
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_path_returns_filename() {
        assert_eq!(
            redact_path(Path::new("/srv/document_storage/aadhaar_front.jpg")),
            "aadhaar_front.jpg"
        );
    }

    #[test]
    fn test_redact_path_no_filename() {
        assert_eq!(redact_path(Path::new("/")), "<unknown>");
    }

    #[test]
    fn test_redact_arg_path_and_plain() {
        assert_eq!(redact_arg("/tmp/x/lead.mp3", 10), "lead.mp3");
        assert_eq!(redact_arg("lead-42", 10), "lead-42");
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_for_log("abc", 10), "abc");
    }

    #[test]
    fn test_truncate_long_text_marks_dropped_chars() {
        let out = truncate_for_log("abcdefghij", 4);
        assert_eq!(out, "abcd… [6 more chars]");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let out = truncate_for_log("आधार कार्ड", 3);
        assert!(out.starts_with("आधा"));
    }

    #[test]
    fn test_sanitize_file_name_strips_directories() {
        assert_eq!(
            sanitize_file_name("../../etc/pan card.png").as_deref(),
            Some("pan_card.png")
        );
        assert_eq!(
            sanitize_file_name("C:\\Users\\agent\\scan.jpg").as_deref(),
            Some("scan.jpg")
        );
    }

    #[test]
    fn test_sanitize_file_name_rejects_empty() {
        assert_eq!(sanitize_file_name(""), None);
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name("dir/"), None);
    }
}
