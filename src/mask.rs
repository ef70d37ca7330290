//! Reversible masking
//!
//! Hides fragile substrings behind a placeholder before a transformation step
//! that would corrupt them, and puts them back afterwards. The Markdown pass
//! uses this for LaTeX delimiters: entity decoding and block parsing both
//! mis-tokenize `\(`, `\)`, `\[` and `\]`.
//!
//! Placeholders are private-use characters, which pass through HTML and
//! Markdown rendering unchanged. A card may still contain one as text, so the
//! math placeholder is picked among [`MATH_CANDIDATES`] for each text.

use std::ops::RangeInclusive;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Preferred placeholder for math delimiters in the Markdown pass
pub const MATH_PLACEHOLDER: &str = "\u{e0ff}";

/// Symbols the math placeholder is picked from, disjoint from the cloze
/// alphabet
pub const MATH_CANDIDATES: RangeInclusive<char> = '\u{e0ff}'..='\u{e1fe}';

/// `\[...\]` and `\(...\)`, non-greedy, spanning lines
pub static MATH_DELIMITERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\\\[[\s\S]*?\\\])|(\\\([\s\S]*?\\\))").unwrap());

// =============================================================================
// MaskRecord
// =============================================================================

/// Ordered record of the substrings hidden behind one placeholder.
///
/// Matches are stored in left-to-right occurrence order and restored in the
/// same order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaskRecord {
    placeholder: String,
    matches: Vec<String>,
}

impl MaskRecord {
    /// Mask every match of `pattern` in `text`, returning the masked text and
    /// the record needed to undo it.
    pub fn mask(text: &str, pattern: &Regex, placeholder: &str) -> (String, Self) {
        let (masked, matches) = mask(text, pattern, placeholder);
        let record = Self {
            placeholder: placeholder.to_string(),
            matches,
        };
        (masked, record)
    }

    /// Mask math delimiters behind the first [`MATH_CANDIDATES`] symbol that
    /// `text` does not contain.
    ///
    /// When every candidate occurs in `text`, nothing is masked.
    pub fn mask_math(text: &str) -> (String, Self) {
        match free_placeholder(text, MATH_CANDIDATES) {
            Some(ch) => Self::mask(text, &MATH_DELIMITERS, ch.encode_utf8(&mut [0; 4])),
            None => {
                warn!("no free math placeholder, math is not masked");
                (text.to_string(), Self::default())
            }
        }
    }

    /// Put the recorded substrings back into `text`
    pub fn restore(&self, text: &str) -> String {
        unmask(text, &self.placeholder, &self.matches)
    }

    /// Recorded substrings, in occurrence order
    pub fn matches(&self) -> &[String] {
        &self.matches
    }

    /// Number of masked substrings
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Check if nothing was masked
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

// =============================================================================
// Free functions
// =============================================================================

/// First of `candidates` that does not occur in `text`
pub fn free_placeholder(text: &str, candidates: impl IntoIterator<Item = char>) -> Option<char> {
    candidates.into_iter().find(|ch| !text.contains(*ch))
}

/// Replace every non-overlapping match of `pattern` with `placeholder`.
///
/// Returns the masked text and the matched substrings in left-to-right order.
/// With no match the text is returned unchanged with an empty list.
///
/// A text that already contains `placeholder` is not masked either, since
/// unmasking could not tell its own occurrences apart.
pub fn mask(text: &str, pattern: &Regex, placeholder: &str) -> (String, Vec<String>) {
    if placeholder.is_empty() || text.contains(placeholder) {
        warn!(placeholder = ?placeholder, "text already contains the mask placeholder, not masking");
        return (text.to_string(), Vec::new());
    }

    let mut matches = Vec::new();
    let masked = pattern.replace_all(text, |caps: &regex::Captures<'_>| {
        matches.push(caps[0].to_string());
        placeholder.to_string()
    });
    (masked.into_owned(), matches)
}

/// Replace each `placeholder` occurrence, left to right, with the next unused
/// entry of `matches`.
///
/// Surplus matches are dropped and surplus placeholders are left in place.
/// A count mismatch means the intervening step dropped or duplicated a
/// placeholder; it is logged but not treated as an error.
pub fn unmask(text: &str, placeholder: &str, matches: &[String]) -> String {
    if matches.is_empty() || placeholder.is_empty() {
        return text.to_string();
    }

    let mut output = String::with_capacity(text.len());
    let mut pending = matches.iter();
    let mut found = 0usize;
    let mut last = 0usize;

    for (pos, _) in text.match_indices(placeholder) {
        found += 1;
        output.push_str(&text[last..pos]);
        match pending.next() {
            Some(original) => output.push_str(original),
            None => output.push_str(placeholder),
        }
        last = pos + placeholder.len();
    }
    output.push_str(&text[last..]);

    if found != matches.len() {
        warn!(
            expected = matches.len(),
            found,
            "placeholder count changed between mask and unmask"
        );
    }

    output
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mask_math_delimiters() {
        let text = r"a \(x^2\) b \[\frac{1}{2}\] c";
        let (masked, matches) = mask(text, &MATH_DELIMITERS, MATH_PLACEHOLDER);
        assert_eq!(masked, format!("a {0} b {0} c", MATH_PLACEHOLDER));
        assert_eq!(matches, vec![r"\(x^2\)", r"\[\frac{1}{2}\]"]);
    }

    #[test]
    fn test_mask_is_non_greedy_and_multiline() {
        let text = "\\(a\\) and \\(b\nc\\)";
        let (_, matches) = mask(text, &MATH_DELIMITERS, MATH_PLACEHOLDER);
        assert_eq!(matches, vec!["\\(a\\)", "\\(b\nc\\)"]);
    }

    #[test]
    fn test_zero_matches_boundary() {
        let (masked, matches) = mask("plain *text*", &MATH_DELIMITERS, MATH_PLACEHOLDER);
        assert_eq!(masked, "plain *text*");
        assert!(matches.is_empty());
        assert_eq!(unmask("plain *text*", MATH_PLACEHOLDER, &[]), "plain *text*");
    }

    #[test]
    fn test_unmask_restores_in_order() {
        let matches = vec!["one".to_string(), "two".to_string()];
        let text = format!("<p>{0}</p><p>{0}</p>", MATH_PLACEHOLDER);
        assert_eq!(unmask(&text, MATH_PLACEHOLDER, &matches), "<p>one</p><p>two</p>");
    }

    #[test]
    fn test_unmask_tolerates_dropped_placeholder() {
        let matches = vec!["one".to_string(), "two".to_string()];
        let text = format!("<p>{}</p>", MATH_PLACEHOLDER);
        assert_eq!(unmask(&text, MATH_PLACEHOLDER, &matches), "<p>one</p>");
    }

    #[test]
    fn test_unmask_leaves_surplus_placeholders() {
        let matches = vec!["one".to_string()];
        let text = format!("{0}{0}", MATH_PLACEHOLDER);
        assert_eq!(
            unmask(&text, MATH_PLACEHOLDER, &matches),
            format!("one{}", MATH_PLACEHOLDER)
        );
    }

    #[test]
    fn test_math_survives_entity_decoding() {
        let text = r"a &lt; b, \(x^2\)";
        let (record_text, record) = MaskRecord::mask(text, &MATH_DELIMITERS, MATH_PLACEHOLDER);
        let decoded = record_text.replace("&lt;", "<");
        assert_eq!(record.len(), 1);
        assert_eq!(record.restore(&decoded), r"a < b, \(x^2\)");
    }

    #[test]
    fn test_text_with_placeholder_is_not_masked() {
        let text = format!(r"{MATH_PLACEHOLDER} icon \(a\)");
        let (masked, matches) = mask(&text, &MATH_DELIMITERS, MATH_PLACEHOLDER);
        assert_eq!(masked, text);
        assert!(matches.is_empty());
        assert_eq!(unmask(&masked, MATH_PLACEHOLDER, &matches), text);
    }

    #[test]
    fn test_free_placeholder() {
        assert_eq!(free_placeholder("abc", ['a', 'x', 'y']), Some('x'));
        assert_eq!(free_placeholder("xy", ['x', 'y']), None);
    }

    #[test]
    fn test_mask_math_avoids_card_symbols() {
        let text = format!(r"{MATH_PLACEHOLDER} icon \(a\)");
        let (masked, record) = MaskRecord::mask_math(&text);
        assert_eq!(masked, format!("{MATH_PLACEHOLDER} icon \u{e100}"));
        assert_eq!(record.matches(), &[r"\(a\)".to_string()]);
        assert_eq!(record.restore(&masked), text);
    }

    #[test]
    fn test_mask_math_gives_up_when_all_symbols_are_used() {
        let taken: String = MATH_CANDIDATES.collect();
        let text = format!(r"{taken} \(a\)");
        let (masked, record) = MaskRecord::mask_math(&text);
        assert_eq!(masked, text);
        assert!(record.is_empty());
    }

    proptest! {
        #[test]
        fn prop_mask_unmask_round_trip(text in "[a-z\\\\()\\[\\] \n]{0,64}") {
            let (masked, matches) = mask(&text, &MATH_DELIMITERS, MATH_PLACEHOLDER);
            prop_assert_eq!(unmask(&masked, MATH_PLACEHOLDER, &matches), text);
        }
    }
}
