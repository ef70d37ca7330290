//! LaTeX math rendering via pulldown-latex → MathML

use pulldown_latex::config::{DisplayMode, RenderConfig};
use pulldown_latex::mathml::push_mathml;
use pulldown_latex::{Parser, Storage};
use tracing::warn;

use super::MathRenderer;
use crate::error::EngineError;
use crate::render::{escape_attr, escape_html};

/// MathML renderer.
///
/// Invalid LaTeX does not fail the block: it renders as an error span showing
/// the source, and the problem is logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexMath;

impl LatexMath {
    pub fn new() -> Self {
        Self
    }
}

impl MathRenderer for LatexMath {
    fn render(&self, latex: &str, display: bool) -> Result<String, EngineError> {
        let storage = Storage::new();
        let parser = Parser::new(latex, &storage);
        let config = RenderConfig {
            display_mode: if display {
                DisplayMode::Block
            } else {
                DisplayMode::Inline
            },
            ..Default::default()
        };

        let events: Vec<_> = parser.collect();
        let errors: Vec<String> = events
            .iter()
            .filter_map(|e| e.as_ref().err().map(|err| err.to_string()))
            .collect();

        if !errors.is_empty() {
            let message = errors.join("; ");
            warn!(latex, %message, "invalid LaTeX");
            return Ok(error_html(latex, &message, display));
        }

        let mut mathml = String::new();
        if let Err(e) = push_mathml(&mut mathml, events.into_iter(), config) {
            let message = e.to_string();
            warn!(latex, %message, "MathML output failed");
            return Ok(error_html(latex, &message, display));
        }
        Ok(mathml)
    }
}

fn error_html(latex: &str, error: &str, display: bool) -> String {
    let mode_class = if display { "math-display" } else { "math-inline" };
    format!(
        r#"<span class="math math-error {mode_class}" title="{}"><code>{}</code></span>"#,
        escape_attr(error),
        escape_html(latex),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_inline_math() {
        let mathml = LatexMath.render("x^2", false).unwrap();
        assert!(mathml.contains("<math"));
        assert!(mathml.contains("</math>"));
    }

    #[test]
    fn test_renders_display_math() {
        let mathml = LatexMath.render(r"\frac{a}{b}", true).unwrap();
        assert!(mathml.contains("<mfrac"));
    }

    #[test]
    fn test_invalid_latex_falls_back() {
        let html = LatexMath.render(r"\frac{a", false).unwrap();
        assert!(html.contains("math-error"));
        assert!(html.contains(r"<code>\frac{a</code>"));
    }
}
