//! Text preparation — narration prompts going out, recognized phrases coming in.
//!
//! Pure functions, no I/O.

use regex::Regex;
use std::sync::LazyLock;

// Compiled regexes — allocated once, reused across calls.
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static RE_NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s']").unwrap());

/// Collapse whitespace in a narration prompt.
///
/// Returns `None` when nothing speakable is left: blank input, or input with
/// no letters or digits at all.
pub fn prepare_narration(text: &str) -> Option<String> {
    let cleaned = RE_WHITESPACE.replace_all(text.trim(), " ").into_owned();
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_alphanumeric()) {
        return None;
    }
    Some(cleaned)
}

/// Normalize a recognized phrase for command matching.
///
/// Lowercases, replaces punctuation with spaces, and collapses whitespace.
/// Apostrophes survive so "what's" stays one word.
pub fn normalize_phrase(phrase: &str) -> String {
    let lowered = phrase.to_lowercase();
    let stripped = RE_NON_WORD.replace_all(&lowered, " ");
    RE_WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
}

/// Split a normalized phrase into words.
pub fn words(phrase: &str) -> Vec<&str> {
    phrase.split(' ').filter(|w| !w.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── prepare_narration ───────────────────────────────────────────

    #[test]
    fn collapses_whitespace() {
        assert_eq!(
            prepare_narration("  You're in\n the   settings page. ").as_deref(),
            Some("You're in the settings page.")
        );
    }

    #[test]
    fn blank_is_not_speakable() {
        assert_eq!(prepare_narration(""), None);
        assert_eq!(prepare_narration(" \n\t "), None);
    }

    #[test]
    fn punctuation_only_is_not_speakable() {
        assert_eq!(prepare_narration("... !?"), None);
    }

    #[test]
    fn digits_are_speakable() {
        assert_eq!(prepare_narration("42").as_deref(), Some("42"));
    }

    // ── normalize_phrase ────────────────────────────────────────────

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(normalize_phrase("Go to the Dashboard!"), "go to the dashboard");
    }

    #[test]
    fn hyphens_become_spaces() {
        assert_eq!(normalize_phrase("pull-requests, please"), "pull requests please");
    }

    #[test]
    fn keeps_apostrophes() {
        assert_eq!(normalize_phrase("What's   new?"), "what's new");
    }

    #[test]
    fn words_skips_empties() {
        assert_eq!(words("open  repos"), vec!["open", "repos"]);
        assert!(words("").is_empty());
    }
}
