//! Text-to-anchor normalization.
//!
//! # Responsibility
//! - Produce the markdown-safe form used for tag names and link fragments.
//!
//! # Invariants
//! - `slugify(slugify(x)) == slugify(x)` for every input.
//! - Output only contains alphanumerics, `-` and `_`.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s").expect("valid ws regex"));

/// Normalizes display text into a markdown anchor-safe slug.
///
/// Rules, applied in order:
/// - trim surrounding whitespace
/// - lower-case
/// - replace each remaining whitespace character with `-` (runs are not collapsed)
/// - drop every character that is not alphanumeric, `-` or `_`
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    WHITESPACE_RE
        .replace_all(&lowered, "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_lowercases_and_dashes_spaces() {
        assert_eq!(slugify("Thermo Dynamics"), "thermo-dynamics");
        assert_eq!(slugify("  Entropy  "), "entropy");
    }

    #[test]
    fn slugify_keeps_runs_of_whitespace_as_runs_of_dashes() {
        assert_eq!(slugify("a  b\tc"), "a--b-c");
    }

    #[test]
    fn slugify_strips_punctuation_but_keeps_dash_and_underscore() {
        assert_eq!(slugify("What's new? (v2_beta-1)"), "whats-new-v2_beta-1");
        assert_eq!(slugify("C++ & Rust!"), "c--rust");
    }

    #[test]
    fn slugify_keeps_unicode_letters_and_digits() {
        assert_eq!(slugify("Über Straße 42"), "über-straße-42");
    }

    #[test]
    fn slugify_of_symbols_only_is_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("   "), "");
        assert_eq!(slugify("?!#"), "");
    }

    #[test]
    fn slugify_is_idempotent() {
        let inputs = [
            "Thermo Dynamics",
            "  Mixed\tCASE  words\n",
            "already-normal_slug",
            "ΣΊΣΥΦΟΣ the Myth",
            "İstanbul Notes",
            "emoji 🚀 launch",
            "--__--",
            "",
        ];
        for input in inputs {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "not idempotent for {input:?}");
        }
    }
}
