//! Display cleanup for prose segments

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").expect("valid regex"));

/// Remove `**bold**` markers, then `*italic*` markers, keeping the text
pub fn strip_emphasis(text: &str) -> String {
    let without_bold = BOLD.replace_all(text, "$1");
    ITALIC.replace_all(&without_bold, "$1").into_owned()
}

/// Prose as shown in a bubble: outer blank lines dropped, emphasis stripped
pub fn display_prose(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(strip_emphasis(trimmed))
}
