//! Content block and cloze span classification
//!
//! Elements are classified at runtime from their tag and class list, the same
//! way the card templates select them (`.markdown-body`, `pre.mermaid`,
//! `.markmap`, `.cloze`, `.cloze-inactive`).

use std::fmt;

use crate::attr::{Attrs, AttrsExt};

/// Class marking a Markdown block
pub const MARKDOWN_CLASS: &str = "markdown-body";
/// Class marking a diagram block (on a `<pre>`)
pub const DIAGRAM_CLASS: &str = "mermaid";
/// Class marking a mind-map block
pub const MINDMAP_CLASS: &str = "markmap";
/// Class of the cloze the current card asks for
pub const CLOZE_CLASS: &str = "cloze";
/// Class of the other clozes on the same note
pub const CLOZE_INACTIVE_CLASS: &str = "cloze-inactive";

// =============================================================================
// BlockKind
// =============================================================================

/// Kind of a render target, one per render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Markdown,
    Diagram,
    Mindmap,
}

impl BlockKind {
    /// Returns all kinds in render order
    pub const fn all() -> &'static [BlockKind] {
        &[Self::Markdown, Self::Diagram, Self::Mindmap]
    }

    /// Classify an element from its tag name and attributes
    pub fn identify(tag: &str, attrs: &Attrs) -> Option<Self> {
        if attrs.has_class(MARKDOWN_CLASS) {
            Some(Self::Markdown)
        } else if tag == "pre" && attrs.has_class(DIAGRAM_CLASS) {
            Some(Self::Diagram)
        } else if attrs.has_class(MINDMAP_CLASS) {
            Some(Self::Mindmap)
        } else {
            None
        }
    }

    /// Get kind name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Diagram => "diagram",
            Self::Mindmap => "mindmap",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// ClozeKind
// =============================================================================

/// Fill-in-the-blank span variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClozeKind {
    Active,
    Inactive,
}

impl ClozeKind {
    /// Classify a `<span>` by its class list
    pub fn identify(tag: &str, attrs: &Attrs) -> Option<Self> {
        if tag != "span" {
            return None;
        }
        if attrs.has_class(CLOZE_CLASS) {
            Some(Self::Active)
        } else if attrs.has_class(CLOZE_INACTIVE_CLASS) {
            Some(Self::Inactive)
        } else {
            None
        }
    }
}
