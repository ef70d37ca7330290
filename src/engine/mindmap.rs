//! Mind-map tree building.
//!
//! [`OutlineTransformer`] turns outline text (headings and nested lists, as
//! produced by [`extract_mindmap_text`](crate::normalize::extract_mindmap_text))
//! into a [`MindmapNode`] tree. Headings nest by level; list items nest
//! under the closest heading and under each other.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};

use super::MindmapTransformer;
use crate::config::ResourceUrls;
use crate::error::EngineError;

// =============================================================================
// Types
// =============================================================================

/// One node of a mind-map tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MindmapNode {
    /// Inline HTML label
    pub content: String,
    pub children: Vec<MindmapNode>,
}

impl MindmapNode {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            children: Vec::new(),
        }
    }

    /// Total number of nodes in this subtree
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(MindmapNode::size).sum::<usize>()
    }

    /// Depth of this subtree (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(MindmapNode::depth).max().unwrap_or(0)
    }
}

/// Content features that need extra assets when drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    /// Math is present
    pub katex: bool,
    /// Code is present
    pub hljs: bool,
}

impl Features {
    pub fn is_empty(&self) -> bool {
        !self.katex && !self.hljs
    }
}

/// Scripts and stylesheets to load before drawing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assets {
    pub styles: Vec<String>,
    pub scripts: Vec<String>,
}

impl Assets {
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty() && self.scripts.is_empty()
    }

    /// Styles first, then scripts
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.styles.iter().chain(&self.scripts).map(String::as_str)
    }
}

/// Result of [`MindmapTransformer::transform`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transformed {
    pub root: MindmapNode,
    pub features: Features,
}

// =============================================================================
// OutlineTransformer
// =============================================================================

/// Native mind-map transformer built on pulldown-cmark
#[derive(Debug, Clone, Default)]
pub struct OutlineTransformer {
    urls: ResourceUrls,
}

impl OutlineTransformer {
    pub fn new(urls: ResourceUrls) -> Self {
        Self { urls }
    }
}

impl MindmapTransformer for OutlineTransformer {
    fn transform(&self, text: &str) -> Result<Transformed, EngineError> {
        let parser = Parser::new_ext(text, Options::ENABLE_MATH | Options::ENABLE_STRIKETHROUGH);
        let mut builder = TreeBuilder::new();

        for event in parser {
            builder.feed(event);
        }
        Ok(builder.finish())
    }

    fn used_assets(&self, features: &Features) -> Assets {
        let mut assets = Assets::default();
        if features.katex {
            assets.styles.push(self.urls.katex_css.clone());
            assets.scripts.push(self.urls.katex.clone());
        }
        if features.hljs {
            assets.scripts.push(self.urls.highlight.clone());
        }
        assets
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tree building
// ─────────────────────────────────────────────────────────────────────────────

/// List items rank below every heading level
const LIST_RANK_BASE: usize = 6;

struct TreeBuilder<'a> {
    /// Open nodes with their rank; index 0 is the root
    stack: Vec<(usize, MindmapNode)>,
    /// Inline events of the label being read
    label: Option<Vec<Event<'a>>>,
    list_depth: usize,
    features: Features,
}

impl<'a> TreeBuilder<'a> {
    fn new() -> Self {
        Self {
            stack: vec![(0, MindmapNode::default())],
            label: None,
            list_depth: 0,
            features: Features::default(),
        }
    }

    fn feed(&mut self, event: Event<'a>) {
        match &event {
            Event::InlineMath(_) | Event::DisplayMath(_) => self.features.katex = true,
            Event::Start(Tag::CodeBlock(_)) | Event::Code(_) => self.features.hljs = true,
            _ => {}
        }

        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.open(level as usize);
            }
            Event::End(TagEnd::Heading(_)) => self.close_label(),
            Event::Start(Tag::List(_)) => {
                self.close_label();
                self.list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => {
                self.list_depth = self.list_depth.saturating_sub(1);
            }
            Event::Start(Tag::Item) => self.open(LIST_RANK_BASE + self.list_depth),
            Event::End(TagEnd::Item) => self.close_label(),
            Event::Start(Tag::Paragraph) | Event::End(TagEnd::Paragraph) => {}
            other => {
                if let Some(label) = self.label.as_mut() {
                    label.push(other);
                }
            }
        }
    }

    fn open(&mut self, rank: usize) {
        self.close_label();
        self.fold_to(rank);
        self.stack.push((rank, MindmapNode::default()));
        self.label = Some(Vec::new());
    }

    fn close_label(&mut self) {
        let Some(events) = self.label.take() else {
            return;
        };
        let mut content = String::new();
        html::push_html(&mut content, events.into_iter());
        if let Some((_, node)) = self.stack.last_mut() {
            node.content = content.trim().to_string();
        }
    }

    /// Attach open nodes of rank `>= rank` to their parents
    fn fold_to(&mut self, rank: usize) {
        while self.stack.len() > 1 && self.stack.last().is_some_and(|(r, _)| *r >= rank) {
            if let Some((_, node)) = self.stack.pop()
                && let Some((_, parent)) = self.stack.last_mut()
            {
                parent.children.push(node);
            }
        }
    }

    fn finish(mut self) -> Transformed {
        self.close_label();
        self.fold_to(1);
        let mut root = self.stack.pop().map(|(_, node)| node).unwrap_or_default();

        // A single top-level node is the root itself
        if root.content.is_empty() && root.children.len() == 1 {
            root = root.children.remove(0);
        }
        Transformed {
            root,
            features: self.features,
        }
    }
}
