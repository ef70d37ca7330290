//! Prelude module for common imports.
//!
//! ```ignore
//! use cardmark::prelude::*;
//! ```

// Tree
pub use crate::block::{BlockKind, ClozeKind};
pub use crate::node::{Children, Document, Element, Node, Stats, Text, TextKind};

// Pipeline
pub use crate::pipeline::{
    EngineState, PassError, PassErrors, RenderReport, RenderState, Renderer, RendererBuilder,
    Stage,
};

// Text transforms
pub use crate::cloze::ClozePlaceholders;
pub use crate::mask::{MATH_CANDIDATES, MATH_DELIMITERS, MATH_PLACEHOLDER, MaskRecord};
pub use crate::normalize::{extract_mindmap_text, normalize};

// Configuration
pub use crate::config::{
    Config, DiagramOptions, LogLevel, MarkdownOptions, MindmapOptions, Plugins, ResourceUrls,
    Theme,
};

// Engines
pub use crate::engine::{
    Assets, CmarkEngine, DiagramRenderer, Features, Highlighter, MarkdownEngine, MathRenderer,
    MindmapNode, MindmapTransformer, MindmapView, OutlineTransformer, Transformed,
};

#[cfg(feature = "syntax-highlighting")]
pub use crate::engine::SyntectHighlighter;

#[cfg(feature = "math")]
pub use crate::engine::LatexMath;

// Loading
pub use crate::loader::{NoopLoader, ResourceKind, ResourceLoader, Resources};

// Logging
pub use crate::log::{DomLog, LogEntry};

// Error
pub use crate::error::{ClozeError, ConfigError, EngineError, LoadError};
