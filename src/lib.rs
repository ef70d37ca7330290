//! cardmark - Flashcard content rendering pipeline
//!
//! ## Core Concepts
//!
//! A card arrives as HTML containing render targets: Markdown blocks
//! (`.markdown-body`), diagram sources (`pre.mermaid`) and mind-map
//! outlines (`.markmap`). [`Renderer::render`] turns each target into its
//! final markup in place, while keeping fill-in-the-blank spans and
//! TeX math intact through the Markdown engine.
//!
//! Two reversible tricks make that possible:
//!
//! - **Masking** ([`mask`]): math spans are swapped for a placeholder before
//!   Markdown sees them and swapped back afterwards.
//! - **Cloze placeholders** ([`cloze`]): cloze spans are unwrapped to a pair
//!   of private-use symbols around their content, and rewrapped at the end.
//!
//! ## Modules
//! - `node`: Document/Element/Node/Text tree standing in for the card DOM
//! - `convert`: HTML parsing into the tree
//! - `render`: HTML serialization
//! - `mask`, `cloze`, `normalize`: text transforms around the engines
//! - `engine`: engine traits and native defaults
//! - `loader`: memoized script and stylesheet loading
//! - `pipeline`: the [`Renderer`] driving the passes
//! - `config`, `log`, `error`: configuration, on-card logging, errors
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use cardmark::prelude::*;
//!
//! let renderer = Renderer::builder(Config::default())
//!     .diagram(Arc::new(MyMermaidBridge::new()))
//!     .build();
//!
//! let mut doc = Document::parse(card_html);
//! let report = renderer.render(&mut doc).await;
//! for error in &report.errors {
//!     eprintln!("{error}");
//! }
//! let rendered = doc.to_html();
//! ```

#[macro_use]
mod macros;

// =============================================================================
// Tree
// =============================================================================

/// Attribute types
pub mod attr;

/// Block and cloze classification
pub mod block;

/// Node types: Document, Element, Node, Text
pub mod node;

/// HTML to tree conversion
pub mod convert;

/// HTML rendering
pub mod render;

// =============================================================================
// Text transforms
// =============================================================================

/// Reversible pattern masking
pub mod mask;

/// Cloze placeholder management
pub mod cloze;

/// Block content normalization
pub mod normalize;

// =============================================================================
// Rendering
// =============================================================================

/// Engine traits and native engines
pub mod engine;

/// Engine resource loading
pub mod loader;

/// Render pipeline
pub mod pipeline;

// =============================================================================
// Ambient
// =============================================================================

/// Configuration
pub mod config;

/// On-card log display
pub mod log;

/// Error types
pub mod error;

/// Prelude for common imports
pub mod prelude;

// =============================================================================
// Re-exports
// =============================================================================

// Tree
pub use node::{Children, Document, Element, Node, Stats, Text, TextKind};
pub use block::{BlockKind, ClozeKind};

// Pipeline
pub use pipeline::{
    EngineState, PassError, PassErrors, RenderReport, RenderState, Renderer, RendererBuilder,
    Stage,
};

// Configuration
pub use config::{Config, LogLevel, Plugins, Theme};

// Engines
pub use engine::{
    DiagramRenderer, Highlighter, MarkdownEngine, MathRenderer, MindmapTransformer, MindmapView,
};

// Loading
pub use loader::{ResourceKind, ResourceLoader, Resources};

// Logging
pub use log::DomLog;

// Error types
pub use error::{ClozeError, ConfigError, EngineError, Error, LoadError, Result};
