//! Error types for cardmark.
//!
//! Failures stay local: an engine error affects one block, a load error
//! affects one pass. Nothing here is fatal to the host.

use thiserror::Error;

/// Failure inside an external render engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The engine rejected the source it was given
    #[error("{engine}: {message}")]
    Render {
        /// Engine name
        engine: &'static str,
        /// Message reported by the engine
        message: String,
    },

    /// The engine could not be initialized
    #[error("{engine} failed to initialize: {message}")]
    Init {
        /// Engine name
        engine: &'static str,
        /// Cause
        message: String,
    },

    /// Engine resources could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl EngineError {
    /// Create a render error.
    pub fn render(engine: &'static str, message: impl Into<String>) -> Self {
        Self::Render {
            engine,
            message: message.into(),
        }
    }

    /// Create an initialization error.
    pub fn init(engine: &'static str, message: impl Into<String>) -> Self {
        Self::Init {
            engine,
            message: message.into(),
        }
    }
}

/// Failure loading an external script or stylesheet.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// URL suffix is neither `.js` nor `.css`
    #[error("unsupported resource type: {0}")]
    Unsupported(String),

    /// The loader reported a failure (network error, 404, ...)
    #[error("failed to load {url}: {message}")]
    Failed {
        /// Resource URL
        url: String,
        /// Cause
        message: String,
    },
}

impl LoadError {
    /// Create a load failure for `url`.
    pub fn failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Failure in the cloze placeholder manager.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClozeError {
    /// More cloze spans than placeholder characters
    #[error("{found} cloze spans exceed the {capacity}-symbol placeholder alphabet")]
    AlphabetExhausted {
        /// Spans found in the document
        found: usize,
        /// Placeholders still available
        capacity: usize,
    },

    /// The document already uses too many placeholder symbols as text
    #[error("{found} cloze spans need placeholders, but only {free} symbols are unused by the card")]
    AlphabetOccupied {
        /// Spans found in the document
        found: usize,
        /// Symbols not present in the card
        free: usize,
    },
}

/// Invalid configuration value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Unknown log level name
    #[error("unknown log level `{0}` (expected debug, info, warn, error or off)")]
    LogLevel(String),
}

/// Crate-level error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Cloze(#[from] ClozeError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for cardmark operations.
pub type Result<T> = std::result::Result<T, Error>;
