use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static NON_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z\s]").unwrap());

/// Lowercase, NFKD-fold (accents dropped), every non-letter replaced by a space.
/// All keyword/lexicon matching runs over this form.
pub fn scrub(raw: &str) -> String {
    let folded: String = raw.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    NON_LETTER.replace_all(&folded.to_lowercase(), " ").into_owned()
}

/// `scrub` plus leading/trailing spaces so whole-word containment can check
/// `" keyword "` without special-casing string edges.
pub fn scrub_padded(raw: &str) -> String {
    format!(" {} ", scrub(raw))
}

/// Whole-word/phrase containment over padded scrubbed text: "maga" must not
/// fire inside "magan"; " trade war " matches inside " china trade war ".
pub fn word_in(keyword: &str, padded: &str) -> bool {
    padded.contains(&format!(" {} ", keyword))
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn squash_ws(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `n` characters (not bytes) of `s`.
pub fn prefix_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrub_strips_punctuation_and_digits() {
        assert_eq!(scrub("Trump's 2026 tariffs!"), "trump s      tariffs ");
    }

    #[test]
    fn scrub_folds_accents() {
        assert_eq!(scrub("Québec décrets"), "quebec decrets");
    }

    #[test]
    fn word_in_respects_boundaries() {
        let padded = scrub_padded("magan interview highlights");
        assert!(!word_in("maga", &padded));
        let padded = scrub_padded("maga rally tonight");
        assert!(word_in("maga", &padded));
    }

    #[test]
    fn word_in_matches_phrases() {
        let padded = scrub_padded("china trade war escalates");
        assert!(word_in("trade war", &padded));
    }

    #[test]
    fn prefix_chars_counts_chars_not_bytes() {
        assert_eq!(prefix_chars("héllo", 2), "hé");
        assert_eq!(prefix_chars("ab", 10), "ab");
    }

    #[test]
    fn squash_ws_collapses_runs() {
        assert_eq!(squash_ws("  a\t b\n\nc "), "a b c");
    }
}
