//! Node types: `Element`, `Node`, `Text`, and `Document`.
//!
//! The tree stands in for the card webview's DOM. Hosts hand the pipeline a
//! `Document` (usually via [`Document::parse`]) and read the rendered markup
//! back with [`Document::to_html`].

mod element;
mod text;
mod document;

pub use element::Element;
pub use text::{Text, TextKind};
pub use document::{Document, ElementIterator, Stats, ROOT_TAG};

use smallvec::SmallVec;

/// Node in a VDOM tree - either Element or Text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Box<Element>),
    Text(Text),
}

impl Node {
    // Generates for each variant (element -> Element, etc.):
    //   - is_xxx(&self) -> bool
    //   - as_xxx(&self) -> Option<&Type>
    //   - as_xxx_mut(&mut self) -> Option<&mut Type>
    impl_enum_accessors!(element, text);

    /// Create a text node
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(Text::new(content))
    }
}

impl From<Element> for Node {
    fn from(elem: Element) -> Self {
        Node::Element(Box::new(elem))
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

/// Type alias for children collection.
pub type Children = SmallVec<[Node; 8]>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;

    fn card() -> Document {
        Document::parse(concat!(
            r#"<div class="markdown-body original"># Title<br>text</div>"#,
            r#"<pre class="mermaid">graph TD; A--&gt;B</pre>"#,
            r#"<div class="markmap">- root<br>- child</div>"#,
            r#"<div id="qa"><span class="cloze" data-ordinal="1">x</span></div>"#,
        ))
    }

    #[test]
    fn test_node_accessors() {
        let mut node = Node::from(Element::new("p"));
        assert!(node.is_element());
        assert!(!node.is_text());
        assert_eq!(node.as_element().map(|e| e.tag.as_str()), Some("p"));
        node.as_element_mut().unwrap().push_text("x");
        assert!(node.as_text().is_none());

        let text = Node::text("hi");
        assert_eq!(text.as_text().map(|t| t.content.as_str()), Some("hi"));
    }

    #[test]
    fn test_document_parse_and_stats() {
        let doc = card();
        let stats = doc.collect_stats();
        assert_eq!(stats.markdown_count, 1);
        assert_eq!(stats.diagram_count, 1);
        assert_eq!(stats.mindmap_count, 1);
        assert_eq!(stats.cloze_count, 1);
        assert_eq!(stats.block_count(), 3);
        assert!(!stats.is_static());
    }

    #[test]
    fn test_document_find() {
        let doc = card();
        let pre = doc.find_element(|e| e.tag == "pre").unwrap();
        assert_eq!(pre.text_content(), "graph TD; A-->B");
        assert!(doc.find_element(|e| e.tag == "table").is_none());
        assert!(doc.has_element(|e| e.has_class("markmap")));
        assert_eq!(doc.element_by_id("qa").map(|e| e.tag.as_str()), Some("div"));
    }

    #[test]
    fn test_document_elements_iterator() {
        let doc = Document::new(
            Element::new("div")
                .child(Element::new("span").child(Element::new("b")))
                .child(Element::new("p")),
        );
        let tags: Vec<_> = doc.iter_elements().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["div", "span", "b", "p"]);
        assert!(doc.has_element(|e| e.tag == "b"));
        assert!(!doc.has_element(|e| e.tag == "i"));
    }

    #[test]
    fn test_blocks_skip_nested_same_kind() {
        let doc = Document::parse(
            r#"<div class="markdown-body">a<div class="markdown-body">b</div></div><div class="markdown-body">c</div>"#,
        );
        let blocks = doc.blocks(BlockKind::Markdown);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].text_content(), "c");
    }

    #[test]
    fn test_blocks_mut_write_back() {
        let mut doc = card();
        for block in doc.blocks_mut(BlockKind::Mindmap) {
            block.set_inner_html("<svg></svg>");
        }
        assert!(doc.to_html().contains(r#"<div class="markmap"><svg></svg></div>"#));
    }

    #[test]
    fn test_for_each_element_mut() {
        let mut doc = card();
        doc.for_each_element_mut(|e| {
            e.remove_class("original");
        });
        assert!(!doc.has_element(|e| e.has_class("original")));
        assert!(doc.has_element(|e| e.has_class("markdown-body")));
    }
}
