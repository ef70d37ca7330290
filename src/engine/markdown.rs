//! Markdown rendering with pulldown-cmark.
//!
//! The parser's event stream is rewritten before HTML output:
//!
//! - fenced code goes through the [`Highlighter`], except the diagram
//!   language, which becomes a `<pre class="mermaid">` block for the diagram
//!   pass;
//! - `$...$` / `$$...$$` go through the [`MathRenderer`];
//! - soft breaks become `<br />` when `breaks` is on;
//! - plain text gets the enabled inline plugins (mark, sub, sup) and bare
//!   URL linking.

use std::sync::Arc;

use once_cell::sync::Lazy;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use regex::Regex;
use tracing::warn;

use super::{Highlighter, MarkdownEngine, MathRenderer};
use crate::block::DIAGRAM_CLASS;
use crate::config::{MarkdownOptions, Plugins};
use crate::error::EngineError;
use crate::render::{escape_attr, escape_html};

static MARK: Lazy<Regex> = Lazy::new(|| Regex::new(r"==([^=\s](?:[^=]*?[^=\s])?)==").unwrap());
static SUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\^([^\s^]+)\^").unwrap());
static SUB: Lazy<Regex> = Lazy::new(|| Regex::new(r"~([^\s~]+)~").unwrap());
static BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"]*[^\s<>".,;:!?)\]'*]"#).unwrap());
static HTML_LINK_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^<a[>\s]").unwrap());
static HTML_LINK_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^</a\s*>").unwrap());

// =============================================================================
// CmarkEngine
// =============================================================================

/// Native Markdown engine
#[derive(Clone)]
pub struct CmarkEngine {
    options: MarkdownOptions,
    plugins: Plugins,
    highlighter: Option<Arc<dyn Highlighter>>,
    math: Option<Arc<dyn MathRenderer>>,
}

impl std::fmt::Debug for CmarkEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmarkEngine")
            .field("options", &self.options)
            .field("plugins", &self.plugins)
            .field("highlighter", &self.highlighter.is_some())
            .field("math", &self.math.is_some())
            .finish()
    }
}

impl Default for CmarkEngine {
    fn default() -> Self {
        Self::new(MarkdownOptions::default(), Plugins::default())
    }
}

impl CmarkEngine {
    /// Create an engine with the built-in highlighter and math renderer
    /// (when their features are enabled).
    pub fn new(options: MarkdownOptions, plugins: Plugins) -> Self {
        Self {
            options,
            plugins,
            highlighter: default_highlighter(),
            math: default_math(),
        }
    }

    /// Create an engine with no highlighter and no math renderer
    pub fn plain(options: MarkdownOptions, plugins: Plugins) -> Self {
        Self {
            options,
            plugins,
            highlighter: None,
            math: None,
        }
    }

    /// Replace the code highlighter.
    pub fn with_highlighter(mut self, highlighter: Arc<dyn Highlighter>) -> Self {
        self.highlighter = Some(highlighter);
        self
    }

    /// Replace the math renderer.
    pub fn with_math(mut self, math: Arc<dyn MathRenderer>) -> Self {
        self.math = Some(math);
        self
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS;
        // `~` is the subscript marker when the sub plugin is on
        if !self.plugins.sub {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.plugins.katex {
            options.insert(Options::ENABLE_MATH);
        }
        options
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event rewriting
    // ─────────────────────────────────────────────────────────────────────────

    fn rewrite<'a>(&self, parser: Parser<'a>) -> Vec<Event<'a>> {
        let mut out = Vec::new();
        let mut text = String::new();
        let mut code: Option<(String, String)> = None;
        let mut link_depth = 0usize;

        for event in parser {
            if let Some((_, body)) = code.as_mut() {
                match event {
                    Event::Text(t) => body.push_str(&t),
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some((lang, body)) = code.take() {
                            out.push(Event::Html(self.code_block(&lang, &body).into()));
                        }
                    }
                    _ => {}
                }
                continue;
            }

            // Adjacent text events are merged so inline plugins see whole runs
            if let Event::Text(t) = &event {
                text.push_str(t);
                continue;
            }
            self.flush_text(&mut text, link_depth > 0, &mut out);

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().unwrap_or_default().to_string()
                        }
                        CodeBlockKind::Indented => String::new(),
                    };
                    code = Some((lang, String::new()));
                }
                Event::Start(tag @ (Tag::Link { .. } | Tag::Image { .. })) => {
                    link_depth += 1;
                    out.push(Event::Start(tag));
                }
                Event::End(tag @ (TagEnd::Link | TagEnd::Image)) => {
                    link_depth = link_depth.saturating_sub(1);
                    out.push(Event::End(tag));
                }
                Event::SoftBreak if self.options.breaks => out.push(Event::HardBreak),
                Event::Html(raw) if !self.options.html => out.push(Event::Text(raw)),
                Event::InlineHtml(raw) if !self.options.html => out.push(Event::Text(raw)),
                // Raw `<a>` tags count as links too, so their text is not linkified again
                Event::InlineHtml(raw) => {
                    if HTML_LINK_OPEN.is_match(&raw) {
                        link_depth += 1;
                    } else if HTML_LINK_CLOSE.is_match(&raw) {
                        link_depth = link_depth.saturating_sub(1);
                    }
                    out.push(Event::InlineHtml(raw));
                }
                Event::InlineMath(latex) => out.push(self.math_event(latex, false)),
                Event::DisplayMath(latex) => out.push(self.math_event(latex, true)),
                other => out.push(other),
            }
        }
        self.flush_text(&mut text, link_depth > 0, &mut out);

        out
    }

    fn flush_text<'a>(&self, text: &mut String, in_link: bool, out: &mut Vec<Event<'a>>) {
        if text.is_empty() {
            return;
        }
        let run = std::mem::take(text);
        if in_link {
            out.push(Event::Text(CowStr::from(run)));
            return;
        }
        match self.decorate(&run) {
            Some(html) => out.push(Event::InlineHtml(CowStr::from(html))),
            None => out.push(Event::Text(CowStr::from(run))),
        }
    }

    /// Apply inline plugins and URL linking to a text run.
    ///
    /// Returns escaped HTML, or `None` when nothing applies.
    fn decorate(&self, text: &str) -> Option<String> {
        let rules: [(bool, &Regex, &str); 4] = [
            (self.plugins.mark, &MARK, "<mark>$1</mark>"),
            (self.plugins.sup, &SUP, "<sup>$1</sup>"),
            (self.plugins.sub, &SUB, "<sub>$1</sub>"),
            (self.options.linkify, &BARE_URL, r#"<a href="$0">$0</a>"#),
        ];
        if !rules.iter().any(|(on, re, _)| *on && re.is_match(text)) {
            return None;
        }

        let mut html = escape_html(text);
        for (on, re, replacement) in rules {
            if on {
                html = re.replace_all(&html, replacement).into_owned();
            }
        }
        Some(html)
    }

    fn code_block(&self, lang: &str, body: &str) -> String {
        if lang.is_empty() {
            return format!("<pre><code>{}</code></pre>\n", escape_html(body));
        }
        if lang == self.options.diagram_language {
            return format!("<pre class=\"{DIAGRAM_CLASS}\">{}</pre>\n", escape_html(body));
        }
        let inner = self
            .highlighter
            .as_ref()
            .and_then(|h| h.highlight(body, lang))
            .unwrap_or_else(|| escape_html(body));
        format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            escape_attr(lang),
            inner
        )
    }

    fn math_event<'a>(&self, latex: CowStr<'a>, display: bool) -> Event<'a> {
        let delimiter = if display { "$$" } else { "$" };
        let Some(math) = &self.math else {
            return Event::Text(format!("{delimiter}{latex}{delimiter}").into());
        };
        match math.render(&latex, display) {
            Ok(html) => Event::InlineHtml(html.into()),
            Err(e) => {
                warn!(error = %e, "math rendering failed");
                Event::Text(format!("{delimiter}{latex}{delimiter}").into())
            }
        }
    }
}

impl MarkdownEngine for CmarkEngine {
    fn render(&self, source: &str) -> Result<String, EngineError> {
        let parser = Parser::new_ext(source, self.parser_options());
        let events = self.rewrite(parser);
        let mut output = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut output, events.into_iter());
        Ok(output)
    }
}

fn default_highlighter() -> Option<Arc<dyn Highlighter>> {
    #[cfg(feature = "syntax-highlighting")]
    {
        Some(Arc::new(super::SyntectHighlighter::new()))
    }
    #[cfg(not(feature = "syntax-highlighting"))]
    {
        None
    }
}

fn default_math() -> Option<Arc<dyn MathRenderer>> {
    #[cfg(feature = "math")]
    {
        Some(Arc::new(super::LatexMath::new()))
    }
    #[cfg(not(feature = "math"))]
    {
        None
    }
}
