//! Render engines
//!
//! Each render pass talks to its engine through a narrow trait, so hosts
//! can plug in their own (a webview bridge to a JS library, a test fake) and
//! native builds get defaults:
//!
//! | Trait                 | Default                        |
//! |-----------------------|--------------------------------|
//! | [`MarkdownEngine`]    | [`CmarkEngine`]                |
//! | [`Highlighter`]       | [`SyntectHighlighter`]         |
//! | [`MathRenderer`]      | [`LatexMath`]                  |
//! | [`MindmapTransformer`]| [`OutlineTransformer`]         |
//! | [`DiagramRenderer`]   | none, the pass is skipped      |
//! | [`MindmapView`]       | none, the pass is skipped      |
//!
//! All traits are object safe and `Send + Sync`; async operations return a
//! boxed future.

pub mod markdown;
pub mod mindmap;

#[cfg(feature = "syntax-highlighting")]
pub mod highlight;
#[cfg(feature = "math")]
pub mod math;

use futures_util::future::BoxFuture;

use crate::config::{DiagramOptions, MindmapOptions};
use crate::error::EngineError;
use crate::node::Element;

pub use markdown::CmarkEngine;
pub use mindmap::{Assets, Features, MindmapNode, OutlineTransformer, Transformed};

#[cfg(feature = "syntax-highlighting")]
pub use highlight::SyntectHighlighter;
#[cfg(feature = "math")]
pub use math::LatexMath;

/// Markdown source to HTML
pub trait MarkdownEngine: Send + Sync {
    fn render(&self, source: &str) -> Result<String, EngineError>;
}

/// Fenced code highlighting.
///
/// Returns `None` for languages it does not know; the caller then emits the
/// escaped code as is.
pub trait Highlighter: Send + Sync {
    fn highlight(&self, code: &str, lang: &str) -> Option<String>;
}

/// LaTeX to HTML or MathML
pub trait MathRenderer: Send + Sync {
    fn render(&self, latex: &str, display: bool) -> Result<String, EngineError>;
}

/// Diagram renderer, run once over every diagram element of a document
pub trait DiagramRenderer: Send + Sync {
    /// Called once before the first run
    fn initialize(&self, _options: &DiagramOptions) -> Result<(), EngineError> {
        Ok(())
    }

    /// Render every element in place
    fn run<'a>(&'a self, nodes: &'a mut [Element]) -> BoxFuture<'a, Result<(), EngineError>>;
}

/// Outline text to mind-map tree
pub trait MindmapTransformer: Send + Sync {
    fn transform(&self, text: &str) -> Result<Transformed, EngineError>;

    /// Extra scripts and styles the given features need
    fn used_assets(&self, features: &Features) -> Assets;
}

/// Draws a mind-map tree into a container
pub trait MindmapView: Send + Sync {
    /// `container` is the `<svg>` element created for the block
    fn create<'a>(
        &'a self,
        container: &'a mut Element,
        options: &'a MindmapOptions,
        root: &'a MindmapNode,
    ) -> BoxFuture<'a, Result<(), EngineError>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_obj_safe;

    assert_obj_safe!(
        MarkdownEngine,
        Highlighter,
        MathRenderer,
        DiagramRenderer,
        MindmapTransformer,
        MindmapView
    );
}
