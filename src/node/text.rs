//! Text node type
//!
//! Simple text content nodes in the VDOM tree.

// =============================================================================
// TextKind
// =============================================================================

/// How a text node is serialized back to HTML
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextKind {
    /// Escaped on output (`&`, `<`, `>`, U+00A0)
    #[default]
    Normal,
    /// Emitted verbatim (contents of `<script>` and `<style>`)
    Raw,
}

// =============================================================================
// Text
// =============================================================================

/// Text content node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    /// Decoded text content
    pub content: String,
    /// Serialization mode
    pub kind: TextKind,
}

impl Text {
    /// Create a new text node
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: TextKind::Normal,
        }
    }

    /// Create a text node that is serialized without escaping
    pub fn raw(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: TextKind::Raw,
        }
    }

    /// Check if this node bypasses escaping
    pub fn is_raw(&self) -> bool {
        self.kind == TextKind::Raw
    }

    /// Check if text content is empty
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
