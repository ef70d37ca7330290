//! HTML rendering for VDOM
//!
//! Serializes elements the way a browser's `innerHTML` getter does, so the
//! text fed to the Markdown pass matches what the card webview would expose:
//! `&`, `<`, `>` and no-break spaces are escaped in text, void elements have
//! no closing tag, and `<script>`/`<style>` contents are emitted verbatim.

use crate::attr::Attrs;
use crate::node::{Element, Node};

// =============================================================================
// Element Rendering
// =============================================================================

/// Render an element, including its own tags (`outerHTML`).
pub fn render_element(elem: &Element) -> String {
    let mut output = String::new();
    write_element(elem, &mut output);
    output
}

/// Render a list of nodes (`innerHTML` of their parent).
pub fn render_children(children: &[Node]) -> String {
    let mut output = String::new();
    for child in children {
        write_node(child, &mut output);
    }
    output
}

/// Render only the opening tag of an element, attributes included.
pub fn render_open_tag(elem: &Element) -> String {
    let mut output = String::new();
    output.push('<');
    output.push_str(&elem.tag);
    write_attrs(&elem.attrs, &mut output);
    output.push('>');
    output
}

/// Render the closing tag of an element (empty for void elements).
pub fn render_close_tag(elem: &Element) -> String {
    if is_void_element(&elem.tag) {
        String::new()
    } else {
        format!("</{}>", elem.tag)
    }
}

fn write_element(elem: &Element, output: &mut String) {
    output.push('<');
    output.push_str(&elem.tag);
    write_attrs(&elem.attrs, output);
    output.push('>');

    // Void elements
    if is_void_element(&elem.tag) {
        return;
    }

    for child in &elem.children {
        write_node(child, output);
    }

    output.push_str("</");
    output.push_str(&elem.tag);
    output.push('>');
}

fn write_node(node: &Node, output: &mut String) {
    match node {
        Node::Element(elem) => write_element(elem, output),
        Node::Text(text) => {
            if text.is_raw() {
                output.push_str(&text.content);
            } else {
                escape_html_into(&text.content, output);
            }
        }
    }
}

fn write_attrs(attrs: &Attrs, output: &mut String) {
    for (name, value) in attrs.iter() {
        output.push(' ');
        output.push_str(name);
        output.push_str("=\"");
        escape_attr_into(value, output);
        output.push('"');
    }
}

// =============================================================================
// Escaping
// =============================================================================

/// Escape HTML special characters in text content.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    escape_html_into(s, &mut result);
    result
}

fn escape_html_into(s: &str, result: &mut String) {
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
}

/// Escape attribute value special characters.
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    escape_attr_into(s, &mut result);
    result
}

fn escape_attr_into(s: &str, result: &mut String) {
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
}

/// Check if element is a void element (no closing tag, no children).
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Check if the element's text children are serialized without escaping.
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(
        tag,
        "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript"
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Text;

    #[test]
    fn test_render_simple_element() {
        let elem = Element::new("div")
            .with_class("markdown-body")
            .child(Element::new("br"))
            .text("a < b");
        assert_eq!(
            render_element(&elem),
            r#"<div class="markdown-body"><br>a &lt; b</div>"#
        );
    }

    #[test]
    fn test_render_raw_text() {
        let mut style = Element::new("style");
        style.children.push(Node::Text(Text::raw("a > b {}")));
        assert_eq!(render_element(&style), "<style>a > b {}</style>");
    }

    #[test]
    fn test_open_close_tags() {
        let elem = Element::new("span").attr("title", "\"q\" & a");
        assert_eq!(render_open_tag(&elem), r#"<span title="&quot;q&quot; &amp; a">"#);
        assert_eq!(render_close_tag(&elem), "</span>");
        assert_eq!(render_close_tag(&Element::new("img")), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("a\u{a0}b"), "a&nbsp;b");
    }
}
