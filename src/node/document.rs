//! Document type and related utilities
//!
//! The root container for a card's VDOM tree, with query and traversal APIs.

use crate::block::BlockKind;
use crate::convert::html::parse_body;

use super::{Element, Node};

/// Tag used for the synthetic root that holds a parsed fragment
pub const ROOT_TAG: &str = "body";

// =============================================================================
// Document
// =============================================================================

/// Root document container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Root element; its children are the card content
    pub root: Element,
}

impl Document {
    /// Create a new document with a root element
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse card markup into a document rooted at `<body>`.
    ///
    /// Attributes of an explicit `<body>` tag (such as a night-mode class)
    /// are kept on the root.
    pub fn parse(html: &str) -> Self {
        Self { root: parse_body(html) }
    }

    /// Serialize the card content (the root's children)
    pub fn to_html(&self) -> String {
        self.root.inner_html()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query API
    // ─────────────────────────────────────────────────────────────────────────

    /// Find first element matching predicate (depth-first search)
    pub fn find_element<F>(&self, predicate: F) -> Option<&Element>
    where
        F: Fn(&Element) -> bool,
    {
        Self::find_in_element(&self.root, &predicate)
    }

    fn find_in_element<'a, F>(elem: &'a Element, predicate: &F) -> Option<&'a Element>
    where
        F: Fn(&Element) -> bool,
    {
        if predicate(elem) {
            return Some(elem);
        }
        for child in &elem.children {
            if let Some(child_elem) = child.as_element()
                && let Some(found) = Self::find_in_element(child_elem, predicate)
            {
                return Some(found);
            }
        }
        None
    }

    /// Check if any element matches predicate
    pub fn has_element<F>(&self, predicate: F) -> bool
    where
        F: Fn(&Element) -> bool,
    {
        self.iter_elements().any(|e| predicate(e))
    }

    /// Find the first element with the given `id`
    pub fn element_by_id(&self, id: &str) -> Option<&Element> {
        self.find_element(|e| e.id() == Some(id))
    }

    /// Find the first element with the given `id` (mutable)
    pub fn element_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        Self::find_by_id_mut(&mut self.root, id)
    }

    fn find_by_id_mut<'a>(elem: &'a mut Element, id: &str) -> Option<&'a mut Element> {
        if elem.id() == Some(id) {
            return Some(elem);
        }
        elem.children_elements_mut()
            .find_map(|child| Self::find_by_id_mut(child, id))
    }

    /// Iterate over all elements (depth-first, document order)
    pub fn iter_elements(&self) -> ElementIterator<'_> {
        ElementIterator::new(&self.root)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Blocks
    // ─────────────────────────────────────────────────────────────────────────

    /// Outermost blocks of `kind` in document order.
    ///
    /// Blocks nested inside a block of the same kind are not returned: the
    /// outer block's render replaces them.
    pub fn blocks(&self, kind: BlockKind) -> Vec<&Element> {
        let mut results = Vec::new();
        Self::collect_blocks(&self.root, kind, &mut results);
        results
    }

    fn collect_blocks<'a>(elem: &'a Element, kind: BlockKind, results: &mut Vec<&'a Element>) {
        if elem.block_kind() == Some(kind) {
            results.push(elem);
            return;
        }
        for child in elem.children_elements() {
            Self::collect_blocks(child, kind, results);
        }
    }

    /// Outermost blocks of `kind` in document order (mutable)
    pub fn blocks_mut(&mut self, kind: BlockKind) -> Vec<&mut Element> {
        let mut results = Vec::new();
        Self::collect_blocks_mut(&mut self.root, kind, &mut results);
        results
    }

    fn collect_blocks_mut<'a>(
        elem: &'a mut Element,
        kind: BlockKind,
        results: &mut Vec<&'a mut Element>,
    ) {
        if elem.block_kind() == Some(kind) {
            results.push(elem);
            return;
        }
        for child in elem.children_elements_mut() {
            Self::collect_blocks_mut(child, kind, results);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Closure-based traversal API
    // ─────────────────────────────────────────────────────────────────────────

    /// Visit all elements with a closure (mutable)
    pub fn for_each_element_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Element),
    {
        Self::visit_elements_mut_recursive(&mut self.root, &mut f);
    }

    fn visit_elements_mut_recursive<F>(elem: &mut Element, f: &mut F)
    where
        F: FnMut(&mut Element),
    {
        f(elem);
        for child in elem.children_elements_mut() {
            Self::visit_elements_mut_recursive(child, f);
        }
    }

    /// Collect statistics about the document
    pub fn collect_stats(&self) -> Stats {
        let mut stats = Stats::default();
        Self::collect_stats_recursive(&self.root, &mut stats);
        stats
    }

    fn collect_stats_recursive(elem: &Element, stats: &mut Stats) {
        stats.element_count += 1;

        match elem.block_kind() {
            Some(BlockKind::Markdown) => stats.markdown_count += 1,
            Some(BlockKind::Diagram) => stats.diagram_count += 1,
            Some(BlockKind::Mindmap) => stats.mindmap_count += 1,
            None => {}
        }
        if elem.cloze_kind().is_some() {
            stats.cloze_count += 1;
        }

        for child in &elem.children {
            match child {
                Node::Element(e) => Self::collect_stats_recursive(e, stats),
                Node::Text(_) => stats.text_count += 1,
            }
        }
    }
}

// =============================================================================
// ElementIterator - depth-first element traversal
// =============================================================================

/// Depth-first iterator over elements
pub struct ElementIterator<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> ElementIterator<'a> {
    fn new(root: &'a Element) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for ElementIterator<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let elem = self.stack.pop()?;
        // Push children in reverse order so they're visited left-to-right
        for child in elem.children.iter().rev() {
            if let Some(child_elem) = child.as_element() {
                self.stack.push(child_elem);
            }
        }
        Some(elem)
    }
}

// =============================================================================
// Stats - document statistics
// =============================================================================

/// Document statistics collected from traversal
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    pub markdown_count: usize,
    pub diagram_count: usize,
    pub mindmap_count: usize,
    pub cloze_count: usize,
    pub text_count: usize,
    pub element_count: usize,
}

impl Stats {
    /// Total render targets across the three passes
    pub fn block_count(&self) -> usize {
        self.markdown_count + self.diagram_count + self.mindmap_count
    }

    /// Check if the document has nothing to render
    pub fn is_static(&self) -> bool {
        self.block_count() == 0
    }
}
