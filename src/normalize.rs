//! HTML to Markdown source normalization
//!
//! The card editor stores what the author typed as HTML: `<` becomes `&lt;`,
//! line breaks become `<br>`. These functions recover the literal source the
//! Markdown and mind-map engines expect. All of them are pure.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(amp|lt|gt|nbsp|quot|#39);").unwrap());

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

/// Tab width used when expanding tabs in Markdown source
pub const TAB_WIDTH: usize = 4;

fn decode_entity(name: &str) -> &'static str {
    match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "nbsp" => " ",
        "quot" => "\"",
        "#39" => "'",
        _ => "",
    }
}

/// Recover Markdown source from editor HTML.
///
/// Trims surrounding whitespace, decodes `&amp;`, `&lt;`, `&gt;`, `&nbsp;`,
/// `&quot;` and `&#39;` in a single pass (no other entity is touched), and
/// turns every `<br>`/`<br/>`/`<BR />` into a newline.
pub fn normalize(html: &str) -> String {
    let decoded = ENTITY.replace_all(html.trim(), |caps: &Captures<'_>| decode_entity(&caps[1]));
    LINE_BREAK.replace_all(&decoded, "\n").into_owned()
}

/// [`normalize`], then expand each tab to four spaces.
///
/// The Markdown engine treats a leading tab as an indented code block.
pub fn normalize_with_tabs(html: &str) -> String {
    normalize(html).replace('\t', &" ".repeat(TAB_WIDTH))
}

// =============================================================================
// Mind-map source
// =============================================================================

static MINDMAP_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?[^>]*>").unwrap());
static MINDMAP_PRE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?pre[^>]*>").unwrap());
static MINDMAP_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?span[^>]*>").unwrap());
static MINDMAP_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(/?(?:ol|ul|div|li))[^>]*>").unwrap());

/// Entity substitutions applied last, in this order
static MINDMAP_ENTITIES: Lazy<[(Regex, &'static str); 5]> = Lazy::new(|| {
    [
        (Regex::new(r"(?i)&nbsp;").unwrap(), " "),
        (Regex::new(r"(?i)&tab;").unwrap(), "\t"),
        (Regex::new(r"(?i)&gt;").unwrap(), ">"),
        (Regex::new(r"(?i)&lt;").unwrap(), "<"),
        (Regex::new(r"(?i)&amp;").unwrap(), "&"),
    ]
});

/// Extract outline text from the HTML of a mind-map block.
///
/// List items become `- ` bullets, list and `<div>` closings become line
/// breaks, `<pre>`/`<span>` tags are dropped, and a few entities are
/// decoded. Other markup is left for the mind-map transformer.
pub fn extract_mindmap_text(html: &str) -> String {
    let text = MINDMAP_BREAK.replace_all(html, "\n");
    let text = MINDMAP_PRE.replace_all(&text, "");
    let text = MINDMAP_SPAN.replace_all(&text, "");
    let text = MINDMAP_LIST.replace_all(&text, |caps: &Captures<'_>| {
        match caps[1].to_ascii_lowercase().as_str() {
            "li" => "- ",
            "/ol" | "/ul" | "/div" => "\n",
            _ => "",
        }
    });

    let mut text = text.into_owned();
    for (pattern, replacement) in MINDMAP_ENTITIES.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }
    text
}

// =============================================================================
// Tests
// =============================================================================
