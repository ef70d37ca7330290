//! Render pass error types.

use std::fmt;

use thiserror::Error;

use crate::block::BlockKind;

/// Pipeline step an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Cloze,
    Markdown,
    Diagram,
    Mindmap,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cloze => "cloze",
            Self::Markdown => "markdown",
            Self::Diagram => "diagram",
            Self::Mindmap => "mindmap",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<BlockKind> for Stage {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Markdown => Self::Markdown,
            BlockKind::Diagram => Self::Diagram,
            BlockKind::Mindmap => Self::Mindmap,
        }
    }
}

/// Failure of one pass, or of one block within a pass.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{stage}{}: {message}", format_block(.block))]
pub struct PassError {
    /// Step that failed
    pub stage: Stage,
    /// Index of the block within its pass, when the failure is per block
    pub block: Option<usize>,
    /// The error message
    pub message: String,
}

fn format_block(block: &Option<usize>) -> String {
    match block {
        Some(index) => format!(" [block {}]", index),
        None => String::new(),
    }
}

impl PassError {
    pub fn new(stage: impl Into<Stage>, message: impl fmt::Display) -> Self {
        Self {
            stage: stage.into(),
            block: None,
            message: message.to_string(),
        }
    }

    /// Attach the index of the failing block.
    pub fn with_block(mut self, index: usize) -> Self {
        self.block = Some(index);
        self
    }
}

/// Errors collected over one render.
#[derive(Debug, Clone, Default, Error, PartialEq, Eq)]
#[error("{} render error(s):\n{}", self.errors.len(), format_errors(&self.errors))]
pub struct PassErrors {
    pub errors: Vec<PassError>,
}

fn format_errors(errors: &[PassError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

impl PassErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn push(&mut self, error: PassError) {
        self.errors.push(error);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PassError> {
        self.errors.iter()
    }

    /// Errors from one stage
    pub fn by_stage(&self, stage: Stage) -> impl Iterator<Item = &PassError> {
        self.errors.iter().filter(move |e| e.stage == stage)
    }

    /// Check if any error came from `stage`
    pub fn has_stage(&self, stage: Stage) -> bool {
        self.by_stage(stage).next().is_some()
    }
}

impl Extend<PassError> for PassErrors {
    fn extend<T: IntoIterator<Item = PassError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for PassErrors {
    type Item = PassError;
    type IntoIter = std::vec::IntoIter<PassError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a PassErrors {
    type Item = &'a PassError;
    type IntoIter = std::slice::Iter<'a, PassError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_error_display() {
        let err = PassError::new(BlockKind::Markdown, "bad input").with_block(2);
        assert_eq!(err.to_string(), "markdown [block 2]: bad input");
        assert_eq!(PassError::new(Stage::Cloze, "full").to_string(), "cloze: full");
    }

    #[test]
    fn test_collection() {
        let mut errors = PassErrors::new();
        assert!(errors.is_empty());
        errors.push(PassError::new(Stage::Diagram, "parse error"));
        errors.extend([PassError::new(Stage::Mindmap, "x").with_block(0)]);

        assert_eq!(errors.len(), 2);
        assert!(errors.has_stage(Stage::Diagram));
        assert!(!errors.has_stage(Stage::Markdown));
        assert_eq!(
            errors.to_string(),
            "2 render error(s):\n  - diagram: parse error\n  - mindmap [block 0]: x"
        );
    }
}
