//! ANSI stripping: Remove terminal escape sequences before speech.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

// CSI sequences (colors, cursor movement, private modes) and OSC strings
// terminated by BEL or ST.
static ANSI_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .map_err(|e| log::error!("ANSI pattern failed to compile: {e}"))
        .ok()
});

/// Remove ANSI escape sequences from `text`.
///
/// Borrows when there is nothing to strip.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    if !text.contains('\x1b') {
        return Cow::Borrowed(text);
    }
    match ANSI_PATTERN.as_ref() {
        Some(pattern) => pattern.replace_all(text, ""),
        None => Cow::Borrowed(text),
    }
}
