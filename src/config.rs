//! Renderer configuration
//!
//! One canonical configuration replaces the per-template copies of the card
//! script: which Markdown plugins are on, where engine resources come from,
//! and the options each engine is initialized with.
//!
//! ```ignore
//! let config = Config::default()
//!     .with_log_level(LogLevel::Debug)
//!     .with_plugins(Plugins::default().with_sup(true));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::node::Document;

// =============================================================================
// LogLevel
// =============================================================================

/// Verbosity of the on-card log.
///
/// Ordered from quietest to noisiest, so `level <= configured` means the
/// message is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Off,
    #[default]
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Check if an event at `level` passes this threshold
    pub fn allows(self, level: &tracing::Level) -> bool {
        let rank = match *level {
            tracing::Level::ERROR => LogLevel::Error,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::INFO => LogLevel::Info,
            _ => LogLevel::Debug,
        };
        self != LogLevel::Off && rank <= self
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            _ => Err(ConfigError::LogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Plugins
// =============================================================================

/// Optional Markdown syntax extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plugins {
    /// `==marked==` to `<mark>`
    pub mark: bool,
    /// `~sub~` to `<sub>`
    pub sub: bool,
    /// `^sup^` to `<sup>`
    pub sup: bool,
    /// `$...$` and `$$...$$` math
    pub katex: bool,
}

impl Default for Plugins {
    fn default() -> Self {
        Self {
            mark: true,
            sub: false,
            sup: false,
            katex: true,
        }
    }
}

impl Plugins {
    /// Every plugin off
    pub const NONE: Self = Self {
        mark: false,
        sub: false,
        sup: false,
        katex: false,
    };

    impl_with_setters!(mark: bool, sub: bool, sup: bool, katex: bool);
}

// =============================================================================
// ResourceUrls
// =============================================================================

/// Script and stylesheet locations of the engines and their plugins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUrls {
    pub markdownit: String,
    pub highlight: String,
    pub mark: String,
    pub sub: String,
    pub sup: String,
    pub texmath: String,
    pub texmath_css: String,
    pub katex: String,
    pub katex_css: String,
    pub mermaid: String,
    pub d3: String,
    pub markmap_lib: String,
    pub markmap_view: String,
}

const CDN: &str = "https://gcore.jsdelivr.net";

impl Default for ResourceUrls {
    fn default() -> Self {
        Self {
            markdownit: format!("{CDN}/npm/markdown-it@14.1.0/dist/markdown-it.min.js"),
            highlight: format!("{CDN}/gh/highlightjs/cdn-release@11.11.1/build/highlight.min.js"),
            mark: format!("{CDN}/npm/markdown-it-mark@4.0.0/dist/markdown-it-mark.min.js"),
            sub: format!("{CDN}/npm/markdown-it-sub@2.0.0/dist/markdown-it-sub.min.js"),
            sup: format!("{CDN}/npm/markdown-it-sup@2.0.0/dist/markdown-it-sup.min.js"),
            texmath: format!("{CDN}/npm/markdown-it-texmath@1.0.0/texmath.min.js"),
            texmath_css: format!("{CDN}/npm/markdown-it-texmath@1.0.0/css/texmath.min.css"),
            katex: format!("{CDN}/npm/katex@0.16.18/dist/katex.min.js"),
            katex_css: format!("{CDN}/npm/katex@0.16.18/dist/katex.min.css"),
            mermaid: format!("{CDN}/npm/mermaid@11.6.0/dist/mermaid.min.js"),
            d3: format!("{CDN}/npm/d3@7/dist/d3.min.js"),
            markmap_lib: format!("{CDN}/npm/markmap-lib@0.18.11/dist/browser/index.iife.min.js"),
            markmap_view: format!("{CDN}/npm/markmap-view@0.18.10/dist/browser/index.min.js"),
        }
    }
}

impl ResourceUrls {
    /// Load groups for the Markdown engine.
    ///
    /// Groups load one after another; the URLs inside a group load together.
    pub fn markdown_groups(&self, plugins: &Plugins) -> Vec<Vec<String>> {
        let mut groups = vec![vec![self.markdownit.clone(), self.highlight.clone()]];
        for (enabled, url) in [
            (plugins.mark, &self.mark),
            (plugins.sub, &self.sub),
            (plugins.sup, &self.sup),
        ] {
            if enabled {
                groups.push(vec![url.clone()]);
            }
        }
        if plugins.katex {
            groups.push(vec![
                self.texmath.clone(),
                self.texmath_css.clone(),
                self.katex.clone(),
                self.katex_css.clone(),
            ]);
        }
        groups
    }

    /// Load groups for the diagram engine
    pub fn diagram_groups(&self) -> Vec<Vec<String>> {
        vec![vec![self.mermaid.clone()]]
    }

    /// Load groups for the mind-map engine.
    ///
    /// Math support is pulled in here only when the Markdown engine did not
    /// already load it.
    pub fn mindmap_groups(&self, plugins: &Plugins) -> Vec<Vec<String>> {
        let mut groups = vec![
            vec![self.d3.clone()],
            vec![self.markmap_lib.clone(), self.markmap_view.clone()],
        ];
        if !plugins.katex {
            groups.push(vec![self.katex.clone(), self.katex_css.clone()]);
        }
        groups
    }
}

// =============================================================================
// Engine options
// =============================================================================

/// Markdown engine options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Pass raw HTML in the source through
    pub html: bool,
    /// Turn single newlines inside paragraphs into `<br>`
    pub breaks: bool,
    /// Turn bare URLs into links
    pub linkify: bool,
    /// Expand tabs to spaces before rendering
    pub expand_tabs: bool,
    /// Fenced code language rendered as a diagram block
    pub diagram_language: String,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            html: true,
            breaks: true,
            linkify: true,
            expand_tabs: true,
            diagram_language: "mermaid".to_string(),
        }
    }
}

impl MarkdownOptions {
    impl_with_setters!(html: bool, breaks: bool, linkify: bool, expand_tabs: bool);

    /// Set the diagram fence language.
    pub fn with_diagram_language(mut self, language: impl Into<String>) -> Self {
        self.diagram_language = language.into();
        self
    }
}

/// Diagram engine options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramOptions {
    /// Engine theme name (`default`, `dark`, `forest`, `neutral`, ...)
    pub theme: String,
    /// Let the engine scan the page on its own
    pub start_on_load: bool,
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            start_on_load: false,
        }
    }
}

impl DiagramOptions {
    impl_with_setters!(start_on_load: bool);

    /// Set the theme name.
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    /// Options adjusted for the card's color scheme
    pub fn for_theme(&self, theme: Theme) -> Self {
        match theme {
            Theme::Dark => self.clone().with_theme("dark"),
            Theme::Light => self.clone(),
        }
    }
}

/// Mind-map view options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MindmapOptions {
    pub auto_fit: bool,
    pub max_width: u32,
    pub zoom: bool,
    pub pan: bool,
}

impl Default for MindmapOptions {
    fn default() -> Self {
        Self {
            auto_fit: true,
            max_width: 400,
            zoom: false,
            pan: false,
        }
    }
}

impl MindmapOptions {
    impl_with_setters!(auto_fit: bool, max_width: u32, zoom: bool, pan: bool);
}

// =============================================================================
// Theme
// =============================================================================

/// Card color scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Night mode is signalled by a `nightMode` or `night_mode` class
    pub fn detect(doc: &Document) -> Self {
        if doc.has_element(|e| e.has_class("nightMode") || e.has_class("night_mode")) {
            Self::Dark
        } else {
            Self::Light
        }
    }
}

// =============================================================================
// Config
// =============================================================================

/// Complete renderer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: LogLevel,
    pub plugins: Plugins,
    pub resources: ResourceUrls,
    pub markdown: MarkdownOptions,
    pub diagram: DiagramOptions,
    pub mindmap: MindmapOptions,
    /// Class hiding not-yet-rendered content; removed when rendering ends
    pub hidden_class: String,
    /// `id` of the on-card log container
    pub log_container_id: String,
    /// `id` of the element the log container is appended to
    pub log_anchor_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            plugins: Plugins::default(),
            resources: ResourceUrls::default(),
            markdown: MarkdownOptions::default(),
            diagram: DiagramOptions::default(),
            mindmap: MindmapOptions::default(),
            hidden_class: "original".to_string(),
            log_container_id: "msgContainer".to_string(),
            log_anchor_id: "qa".to_string(),
        }
    }
}

impl Config {
    impl_with_setters!(
        log_level: LogLevel,
        plugins: Plugins,
        resources: ResourceUrls,
        markdown: MarkdownOptions,
        diagram: DiagramOptions,
        mindmap: MindmapOptions,
    );

    /// Set the class removed from content once rendering ends.
    pub fn with_hidden_class(mut self, class: impl Into<String>) -> Self {
        self.hidden_class = class.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parse() {
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!(" WARN ".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!(
            "loud".parse::<LogLevel>(),
            Err(ConfigError::LogLevel("loud".to_string()))
        );
        assert_eq!(LogLevel::default().to_string(), "error");
    }

    #[test]
    fn test_log_level_threshold() {
        assert!(LogLevel::Warn.allows(&tracing::Level::ERROR));
        assert!(LogLevel::Warn.allows(&tracing::Level::WARN));
        assert!(!LogLevel::Warn.allows(&tracing::Level::INFO));
        assert!(LogLevel::Debug.allows(&tracing::Level::TRACE));
        assert!(!LogLevel::Off.allows(&tracing::Level::ERROR));
    }

    #[test]
    fn test_markdown_groups() {
        let urls = ResourceUrls::default();
        let groups = urls.markdown_groups(&Plugins::default());
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0], vec![urls.markdownit.clone(), urls.highlight.clone()]);
        assert_eq!(groups[1], vec![urls.mark.clone()]);
        assert_eq!(groups[2].len(), 4);

        let groups = urls.markdown_groups(&Plugins::NONE.with_sup(true));
        assert_eq!(groups, vec![
            vec![urls.markdownit.clone(), urls.highlight.clone()],
            vec![urls.sup.clone()],
        ]);
    }

    #[test]
    fn test_mindmap_groups_katex() {
        let urls = ResourceUrls::default();
        assert_eq!(urls.mindmap_groups(&Plugins::default()).len(), 2);
        let groups = urls.mindmap_groups(&Plugins::NONE);
        assert_eq!(groups[2], vec![urls.katex.clone(), urls.katex_css.clone()]);
    }

    #[test]
    fn test_theme_detection() {
        let dark = Document::parse(r#"<div class="card nightMode">x</div>"#);
        assert_eq!(Theme::detect(&dark), Theme::Dark);
        assert_eq!(Theme::detect(&Document::parse("<p>x</p>")), Theme::Light);

        let options = DiagramOptions::default().for_theme(Theme::Dark);
        assert_eq!(options.theme, "dark");
    }

    #[test]
    fn test_builders() {
        let config = Config::default()
            .with_log_level(LogLevel::Info)
            .with_mindmap(MindmapOptions::default().with_zoom(true))
            .with_hidden_class("loading");
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.mindmap.zoom);
        assert_eq!(config.hidden_class, "loading");
        assert!(config.markdown.breaks);
    }
}
