// Text normalization applied before chunking

use once_cell::sync::Lazy;
use regex::Regex;

static NON_PRINTABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\x20-\x7E\n]+").expect("valid non-printable regex"));
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("valid space regex"));
static MULTI_NEWLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{2,}").expect("valid newline regex"));

/// Normalize extracted text down to printable ASCII.
///
/// Non-breaking spaces become spaces, any run of characters outside printable
/// ASCII (newlines excepted) becomes a single space, repeated spaces and
/// repeated newlines are collapsed, and the result is trimmed.
pub fn clean_text(text: &str) -> String {
    let text = text.replace('\u{a0}', " ");
    let text = NON_PRINTABLE.replace_all(&text, " ");
    let text = MULTI_SPACE.replace_all(&text, " ");
    let text = MULTI_NEWLINE.replace_all(&text, "\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_spaces_and_newlines() {
        assert_eq!(clean_text("  a   b\n\n\nc  "), "a b\nc");
    }

    #[test]
    fn test_replaces_non_breaking_space() {
        assert_eq!(clean_text("hello\u{a0}world"), "hello world");
    }

    #[test]
    fn test_replaces_non_ascii_runs_with_single_space() {
        assert_eq!(clean_text("caf\u{e9}\u{e9} ok"), "caf ok");
        assert_eq!(clean_text("tab\tseparated"), "tab separated");
    }

    #[test]
    fn test_carriage_returns_are_removed() {
        assert_eq!(clean_text("line one\r\nline two"), "line one \nline two");
    }

    #[test]
    fn test_empty_and_whitespace_only() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n \u{a0} "), "");
    }
}
