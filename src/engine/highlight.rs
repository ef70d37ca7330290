//! Fenced code highlighting with syntect.
//!
//! Output is classed spans (`hljs-` prefix) inside the `<code>` element, so
//! the card's highlight stylesheet applies unchanged.

use once_cell::sync::Lazy;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tracing::debug;

use super::Highlighter;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

/// Class prefix of emitted spans
pub const CLASS_PREFIX: &str = "hljs-";

/// Syntect-backed highlighter using the bundled syntax definitions
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntectHighlighter;

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, lang: &str) -> Option<String> {
        let syntax = SYNTAX_SET.find_syntax_by_token(lang)?;
        let mut generator = ClassedHTMLGenerator::new_with_class_style(
            syntax,
            &SYNTAX_SET,
            ClassStyle::SpacedPrefixed { prefix: CLASS_PREFIX },
        );
        for line in LinesWithEndings::from(code) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                debug!(lang, error = %e, "highlighting failed");
                return None;
            }
        }
        Some(generator.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_language() {
        let html = SyntectHighlighter.highlight("fn main() {}\n", "rust").unwrap();
        assert!(html.contains("hljs-"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_unknown_language() {
        assert_eq!(SyntectHighlighter.highlight("x", "no-such-language"), None);
    }
}
