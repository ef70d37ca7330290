//! Conversion from HTML markup to VDOM
//!
//! Markup is parsed with html5ever into an `RcDom`, then copied into our own
//! tree. The parse is a full-document parse: whatever the tree builder puts
//! into `<head>` (leading `<style>`/`<link>`) and `<body>` is concatenated in
//! that order, which reproduces what a browser shows for a card fragment.
//!
//! # Flow
//!
//! ```text
//! &str (innerHTML)
//!         │
//!         ▼ html5ever::parse_document
//! RcDom
//!         │
//!         ▼ convert_node
//! Children / Element
//! ```

use html5ever::tendril::TendrilSink;
use html5ever::{Attribute, ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use smallvec::SmallVec;

use crate::attr::Attrs;
use crate::node::{Children, Element, Node, ROOT_TAG, Text};
use crate::render::is_raw_text_element;

// =============================================================================
// Entry points
// =============================================================================

/// Parse `html` as the content of a `<body>`, keeping the body's attributes.
pub fn parse_body(html: &str) -> Element {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);

    let mut body = Element::new(ROOT_TAG);
    let Some(html_elem) = find_child_element(&dom.document, "html") else {
        return body;
    };

    for section in html_elem.children.borrow().iter() {
        if let NodeData::Element { name, attrs, .. } = &section.data {
            match &*name.local {
                "head" => body.children.extend(convert_children(section, false)),
                "body" => {
                    body.attrs = convert_attrs(&attrs.borrow());
                    body.children.extend(convert_children(section, false));
                }
                _ => {}
            }
        }
    }

    body
}

/// Parse `html` into a list of nodes, like assigning `innerHTML`.
pub fn parse_fragment(html: &str) -> Children {
    parse_body(html).children
}

// =============================================================================
// Converter
// =============================================================================

fn find_child_element(handle: &Handle, tag: &str) -> Option<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .find(|child| matches!(&child.data, NodeData::Element { name, .. } if &*name.local == tag))
        .cloned()
}

fn convert_children(handle: &Handle, raw_text: bool) -> Children {
    handle
        .children
        .borrow()
        .iter()
        .filter_map(|child| convert_node(child, raw_text))
        .collect::<SmallVec<_>>()
}

/// Convert one RcDom node.
///
/// Returns None for comments, doctypes and processing instructions.
fn convert_node(handle: &Handle, raw_text: bool) -> Option<Node> {
    match &handle.data {
        NodeData::Text { contents } => {
            let content = contents.borrow().to_string();
            let text = if raw_text { Text::raw(content) } else { Text::new(content) };
            Some(Node::Text(text))
        }
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.to_string();
            let raw = is_raw_text_element(&tag);
            let mut elem = Element::new(tag);
            elem.attrs = convert_attrs(&attrs.borrow());
            elem.children = convert_children(handle, raw);
            Some(Node::Element(Box::new(elem)))
        }
        _ => None,
    }
}

fn convert_attrs(attrs: &[Attribute]) -> Attrs {
    attrs
        .iter()
        .map(|attr| {
            let name = match &attr.name.prefix {
                Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                None => attr.name.local.to_string(),
            };
            (name, attr.value.to_string())
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
