//! Card render pipeline.
//!
//! [`Renderer`] is the context object for a card: configuration, engines,
//! resource memoization and engine state live on it, and it is built once
//! per process and reused for every card display.
//!
//! # Flow
//!
//! ```text
//! render(doc)
//!   │ running guard (a call during an in-flight render is dropped)
//!   │ reveal guard (hidden class removed on every exit path)
//!   ▼
//! cloze placeholderize
//!   ▼
//! markdown pass   mask math → normalize → render → unmask, per block
//!   ▼
//! diagram pass    one run over every diagram element
//!   ▼
//! mind-map pass   extract text → transform → assets → draw, per block
//!   ▼
//! cloze restore → flush on-card log → reveal
//! ```
//!
//! A failing pass is logged and recorded in the [`RenderReport`]; the next
//! pass still runs. Within the Markdown and mind-map passes a failing block
//! keeps its source and does not affect its siblings.

mod error;

pub use error::{PassError, PassErrors, Stage};

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::join_all;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, error, info, warn};

use crate::block::BlockKind;
use crate::cloze::ClozePlaceholders;
use crate::config::{Config, Theme};
use crate::engine::{
    CmarkEngine, DiagramRenderer, MarkdownEngine, MindmapTransformer, MindmapView,
    OutlineTransformer,
};
use crate::error::EngineError;
use crate::loader::{ResourceLoader, Resources};
use crate::log::DomLog;
use crate::mask::MaskRecord;
use crate::node::{Document, Element, Stats};
use crate::normalize::{extract_mindmap_text, normalize, normalize_with_tabs};

/// Class the diagram engine hides unrendered sources with
pub const DIAGRAM_HIDDEN_CLASS: &str = "hidden";

// =============================================================================
// State
// =============================================================================

/// Progress of the current (or last) render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderState {
    #[default]
    Idle,
    LoadingEngines,
    RenderingMarkdown,
    RenderingDiagrams,
    RenderingMindmaps,
    Done,
    Failed,
}

impl RenderState {
    /// Check if a render is in progress
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Done | Self::Failed)
    }
}

/// Initialization state of one engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineState {
    #[default]
    Uninitialized,
    Ready,
}

/// Outcome of [`Renderer::render`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// `Done`, `Failed`, or `Idle` for a skipped call
    pub state: RenderState,
    pub errors: PassErrors,
    /// The call was dropped because another render was in flight
    pub skipped: bool,
    /// What the document contained before rendering
    pub stats: Stats,
}

impl RenderReport {
    /// Report for a call dropped by the re-entrancy guard
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.skipped && self.errors.is_empty()
    }
}

// =============================================================================
// Guards
// =============================================================================

/// Holds the renderer's running flag for the duration of a render
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Removes the hidden class from the whole document when dropped
struct RevealGuard<'a> {
    doc: &'a mut Document,
    hidden_class: &'a str,
}

impl Deref for RevealGuard<'_> {
    type Target = Document;

    fn deref(&self) -> &Document {
        self.doc
    }
}

impl DerefMut for RevealGuard<'_> {
    fn deref_mut(&mut self) -> &mut Document {
        self.doc
    }
}

impl Drop for RevealGuard<'_> {
    fn drop(&mut self) {
        let class = self.hidden_class;
        let mut revealed = 0usize;
        self.doc.for_each_element_mut(|e| {
            if e.remove_class(class) {
                revealed += 1;
            }
        });
        debug!(revealed, "content revealed");
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Card render context
pub struct Renderer {
    config: Config,
    markdown: Arc<dyn MarkdownEngine>,
    diagram: Option<Arc<dyn DiagramRenderer>>,
    mindmap: Arc<dyn MindmapTransformer>,
    mindmap_view: Option<Arc<dyn MindmapView>>,
    resources: Resources,
    engines: Mutex<FxHashMap<BlockKind, EngineState>>,
    running: AtomicBool,
    state: Mutex<RenderState>,
    dom_log: Option<DomLog>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("diagram", &self.diagram.is_some())
            .field("mindmap_view", &self.mindmap_view.is_some())
            .field("resources", &self.resources)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::builder(Config::default()).build()
    }
}

impl Renderer {
    /// Start building a renderer for `config`
    pub fn builder(config: Config) -> RendererBuilder {
        RendererBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// State of the current render, or the outcome of the last one
    pub fn state(&self) -> RenderState {
        *self.state.lock()
    }

    fn set_state(&self, state: RenderState) {
        *self.state.lock() = state;
    }

    /// Initialization state of the engine behind `kind`
    pub fn engine_state(&self, kind: BlockKind) -> EngineState {
        self.engines.lock().get(&kind).copied().unwrap_or_default()
    }

    /// Render every block of `doc` in place.
    ///
    /// Never fails: errors are logged and reported, and the document is
    /// revealed whatever happened.
    pub async fn render(&self, doc: &mut Document) -> RenderReport {
        let Some(_running) = RunningGuard::acquire(&self.running) else {
            warn!("render already in progress, skipping this call");
            return RenderReport::skipped();
        };

        let stats = doc.collect_stats();
        let mut errors = PassErrors::new();
        {
            let mut doc = RevealGuard {
                doc,
                hidden_class: &self.config.hidden_class,
            };

            if stats.is_static() {
                debug!("no content blocks found");
            } else {
                let theme = Theme::detect(&doc);
                let mut clozes = ClozePlaceholders::new();
                match clozes.placeholderize(&mut doc.root) {
                    Ok(_) => {
                        self.run_passes(&mut doc, theme, &mut errors).await;
                        clozes.restore(&mut doc.root);
                    }
                    Err(e) => {
                        error!(error = %e, "cannot protect cloze spans, skipping render passes");
                        errors.push(PassError::new(Stage::Cloze, e));
                    }
                }
            }

            if let Some(log) = &self.dom_log {
                log.flush_into(&mut doc, &self.config.log_container_id, &self.config.log_anchor_id);
            }
        }

        let state = if errors.is_empty() {
            RenderState::Done
        } else {
            RenderState::Failed
        };
        self.set_state(state);
        info!(?state, errors = errors.len(), "render finished");

        RenderReport {
            state,
            errors,
            skipped: false,
            stats,
        }
    }

    async fn run_passes(&self, doc: &mut Document, theme: Theme, errors: &mut PassErrors) {
        for &kind in BlockKind::all() {
            if doc.blocks(kind).is_empty() {
                continue;
            }
            let failures = match kind {
                BlockKind::Markdown => self.markdown_pass(doc).await,
                BlockKind::Diagram => self.diagram_pass(doc, theme).await,
                BlockKind::Mindmap => self.mindmap_pass(doc).await,
            };
            errors.extend(failures);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Engines
    // ─────────────────────────────────────────────────────────────────────────

    /// Load resources and initialize the engine behind `kind`, once.
    ///
    /// A failure leaves the engine uninitialized so the next render retries.
    async fn ensure_engine(&self, kind: BlockKind, theme: Theme) -> Result<(), EngineError> {
        if self.engine_state(kind) == EngineState::Ready {
            return Ok(());
        }
        self.set_state(RenderState::LoadingEngines);

        let resources = &self.config.resources;
        let plugins = &self.config.plugins;
        let groups = match kind {
            BlockKind::Markdown => resources.markdown_groups(plugins),
            BlockKind::Diagram => resources.diagram_groups(),
            BlockKind::Mindmap => resources.mindmap_groups(plugins),
        };
        self.resources.load_groups(&groups).await?;

        if kind == BlockKind::Diagram
            && let Some(diagram) = &self.diagram
        {
            diagram.initialize(&self.config.diagram.for_theme(theme))?;
        }

        self.engines.lock().insert(kind, EngineState::Ready);
        info!(engine = %kind, "engine initialized");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Markdown pass
    // ─────────────────────────────────────────────────────────────────────────

    async fn markdown_pass(&self, doc: &mut Document) -> Vec<PassError> {
        if let Err(e) = self.ensure_engine(BlockKind::Markdown, Theme::Light).await {
            error!(error = %e, "markdown engine unavailable");
            return vec![PassError::new(Stage::Markdown, e)];
        }
        self.set_state(RenderState::RenderingMarkdown);

        let sources: Vec<String> = doc
            .blocks(BlockKind::Markdown)
            .iter()
            .map(|block| block.inner_html())
            .collect();
        let results = join_all(
            sources
                .iter()
                .enumerate()
                .map(|(index, source)| self.render_markdown_block(index, source)),
        )
        .await;

        let mut failures = Vec::new();
        for (block, result) in doc.blocks_mut(BlockKind::Markdown).into_iter().zip(results) {
            match result {
                Ok(html) => block.set_inner_html(&html),
                Err(e) => failures.push(e),
            }
        }
        failures
    }

    async fn render_markdown_block(&self, index: usize, html: &str) -> Result<String, PassError> {
        debug!(block = index, source = html, "markdown block");

        let (masked, math) = MaskRecord::mask_math(html);
        if !math.is_empty() {
            debug!(block = index, count = math.len(), "math delimiters masked");
        }

        let source = if self.config.markdown.expand_tabs {
            normalize_with_tabs(&masked)
        } else {
            normalize(&masked)
        };
        debug!(block = index, source = %source, "normalized source");

        let rendered = self.markdown.render(&source).map_err(|e| {
            error!(block = index, error = %e, "markdown rendering failed");
            PassError::new(Stage::Markdown, e).with_block(index)
        })?;
        debug!(block = index, html = %rendered, "markdown rendered");

        Ok(math.restore(&rendered))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Diagram pass
    // ─────────────────────────────────────────────────────────────────────────

    async fn diagram_pass(&self, doc: &mut Document, theme: Theme) -> Vec<PassError> {
        let Some(renderer) = &self.diagram else {
            debug!("no diagram renderer configured, skipping diagram pass");
            return Vec::new();
        };
        if let Err(e) = self.ensure_engine(BlockKind::Diagram, theme).await {
            error!(error = %e, "diagram engine unavailable");
            return vec![PassError::new(Stage::Diagram, e)];
        }
        self.set_state(RenderState::RenderingDiagrams);

        let mut nodes: Vec<Element> = doc.blocks(BlockKind::Diagram).into_iter().cloned().collect();
        if let Err(e) = renderer.run(&mut nodes).await {
            error!(error = %e, "diagram rendering failed");
            return vec![PassError::new(Stage::Diagram, e)];
        }

        for (slot, mut rendered) in doc.blocks_mut(BlockKind::Diagram).into_iter().zip(nodes) {
            rendered.remove_class(DIAGRAM_HIDDEN_CLASS);
            *slot = rendered;
        }
        debug!("diagram rendering completed");
        Vec::new()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mind-map pass
    // ─────────────────────────────────────────────────────────────────────────

    async fn mindmap_pass(&self, doc: &mut Document) -> Vec<PassError> {
        let Some(view) = &self.mindmap_view else {
            debug!("no mind-map view configured, skipping mind-map pass");
            return Vec::new();
        };
        if let Err(e) = self.ensure_engine(BlockKind::Mindmap, Theme::Light).await {
            error!(error = %e, "mind-map engine unavailable");
            return vec![PassError::new(Stage::Mindmap, e)];
        }
        self.set_state(RenderState::RenderingMindmaps);

        let sources: Vec<String> = doc
            .blocks(BlockKind::Mindmap)
            .iter()
            .map(|block| block.inner_html())
            .collect();
        let results = join_all(
            sources
                .iter()
                .enumerate()
                .map(|(index, source)| self.render_mindmap_block(view.as_ref(), index, source)),
        )
        .await;

        let mut failures = Vec::new();
        for (block, result) in doc.blocks_mut(BlockKind::Mindmap).into_iter().zip(results) {
            match result {
                Ok(svg) => {
                    block.children.clear();
                    block.push_elem(svg);
                }
                Err(e) => failures.push(e),
            }
        }
        failures
    }

    async fn render_mindmap_block(
        &self,
        view: &dyn MindmapView,
        index: usize,
        html: &str,
    ) -> Result<Element, PassError> {
        let fail = |e: EngineError| {
            error!(block = index, error = %e, "mind-map rendering failed");
            PassError::new(Stage::Mindmap, e).with_block(index)
        };

        let text = extract_mindmap_text(html);
        debug!(block = index, source = %text, "mind-map source");

        let mut transformed = self.mindmap.transform(&text).map_err(fail)?;
        // Code highlighting is already loaded by the Markdown engine
        transformed.features.hljs = false;

        let assets = self.mindmap.used_assets(&transformed.features);
        if !assets.is_empty() {
            let urls: Vec<String> = assets.urls().map(str::to_string).collect();
            if let Err(e) = self.resources.load_all(&urls).await {
                warn!(block = index, error = %e, "mind-map assets failed to load");
            }
        }

        let mut svg = Element::new("svg");
        view.create(&mut svg, &self.config.mindmap, &transformed.root)
            .await
            .map_err(fail)?;
        Ok(svg)
    }
}

// =============================================================================
// RendererBuilder
// =============================================================================

/// Builder for [`Renderer`].
///
/// Unset engines fall back to the native defaults; the diagram renderer and
/// mind-map view have none and their passes are skipped when unset.
pub struct RendererBuilder {
    config: Config,
    markdown: Option<Arc<dyn MarkdownEngine>>,
    diagram: Option<Arc<dyn DiagramRenderer>>,
    mindmap: Option<Arc<dyn MindmapTransformer>>,
    mindmap_view: Option<Arc<dyn MindmapView>>,
    loader: Option<Arc<dyn ResourceLoader>>,
    dom_log: Option<DomLog>,
}

impl RendererBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            markdown: None,
            diagram: None,
            mindmap: None,
            mindmap_view: None,
            loader: None,
            dom_log: None,
        }
    }

    pub fn markdown(mut self, engine: Arc<dyn MarkdownEngine>) -> Self {
        self.markdown = Some(engine);
        self
    }

    pub fn diagram(mut self, renderer: Arc<dyn DiagramRenderer>) -> Self {
        self.diagram = Some(renderer);
        self
    }

    pub fn mindmap(mut self, transformer: Arc<dyn MindmapTransformer>) -> Self {
        self.mindmap = Some(transformer);
        self
    }

    pub fn mindmap_view(mut self, view: Arc<dyn MindmapView>) -> Self {
        self.mindmap_view = Some(view);
        self
    }

    pub fn loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Write captured log entries into each rendered card.
    ///
    /// The log's level is set from [`Config::log_level`] on build.
    pub fn dom_log(mut self, log: DomLog) -> Self {
        self.dom_log = Some(log);
        self
    }

    pub fn build(self) -> Renderer {
        let config = self.config;
        let markdown = self.markdown.unwrap_or_else(|| {
            Arc::new(CmarkEngine::new(config.markdown.clone(), config.plugins))
        });
        let mindmap = self
            .mindmap
            .unwrap_or_else(|| Arc::new(OutlineTransformer::new(config.resources.clone())));
        let resources = self.loader.map(Resources::new).unwrap_or_default();
        if let Some(log) = &self.dom_log {
            log.set_level(config.log_level);
        }

        Renderer {
            markdown,
            diagram: self.diagram,
            mindmap,
            mindmap_view: self.mindmap_view,
            resources,
            engines: Mutex::new(FxHashMap::default()),
            running: AtomicBool::new(false),
            state: Mutex::new(RenderState::Idle),
            dom_log: self.dom_log,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use futures_util::future::BoxFuture;
    use static_assertions::assert_impl_all;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    use crate::config::{DiagramOptions, LogLevel, MindmapOptions, Plugins, ResourceUrls};
    use crate::engine::MindmapNode;
    use crate::error::LoadError;
    use crate::loader::ResourceKind;

    assert_impl_all!(Renderer: Send, Sync);

    /// Diagram renderer that replaces each source with an `<svg>`
    #[derive(Default)]
    struct FakeDiagram {
        fail: bool,
        yield_first: bool,
        theme: Mutex<Option<String>>,
        runs: AtomicUsize,
    }

    impl DiagramRenderer for FakeDiagram {
        fn initialize(&self, options: &DiagramOptions) -> Result<(), EngineError> {
            *self.theme.lock() = Some(options.theme.clone());
            Ok(())
        }

        fn run<'a>(&'a self, nodes: &'a mut [Element]) -> BoxFuture<'a, Result<(), EngineError>> {
            Box::pin(async move {
                self.runs.fetch_add(1, Ordering::SeqCst);
                if self.yield_first {
                    tokio::task::yield_now().await;
                }
                if self.fail {
                    return Err(EngineError::render("mermaid", "Parse error on line 1"));
                }
                for node in nodes {
                    let source = node.text_content();
                    node.children.clear();
                    node.push_elem(Element::new("svg").attr("aria-label", source));
                }
                Ok(())
            })
        }
    }

    /// Mind-map view recording the tree size on the drawn `<svg>`
    struct FakeView;

    impl MindmapView for FakeView {
        fn create<'a>(
            &'a self,
            container: &'a mut Element,
            _options: &'a MindmapOptions,
            root: &'a MindmapNode,
        ) -> BoxFuture<'a, Result<(), EngineError>> {
            Box::pin(async move {
                if root.content == "broken" {
                    return Err(EngineError::render("markmap", "no layout"));
                }
                container.set_attr("data-nodes", root.size().to_string());
                Ok(())
            })
        }
    }

    /// Markdown engine that fails on any source containing "boom"
    struct FussyMarkdown;

    impl MarkdownEngine for FussyMarkdown {
        fn render(&self, source: &str) -> Result<String, EngineError> {
            if source.contains("boom") {
                Err(EngineError::render("markdown-it", "boom"))
            } else {
                Ok(format!("<p>{source}</p>"))
            }
        }
    }

    /// Loader whose first request fails
    #[derive(Default)]
    struct FlakyLoader {
        calls: AtomicUsize,
    }

    impl ResourceLoader for FlakyLoader {
        fn load<'a>(&'a self, url: &'a str, _kind: ResourceKind) -> BoxFuture<'a, Result<(), LoadError>> {
            Box::pin(async move {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(LoadError::failed(url, "network error"))
                } else {
                    Ok(())
                }
            })
        }
    }

    /// Loader that records every request and yields before finishing
    #[derive(Default)]
    struct SlowLoader {
        calls: Mutex<Vec<String>>,
    }

    impl ResourceLoader for SlowLoader {
        fn load<'a>(&'a self, url: &'a str, _kind: ResourceKind) -> BoxFuture<'a, Result<(), LoadError>> {
            Box::pin(async move {
                self.calls.lock().push(url.to_string());
                tokio::task::yield_now().await;
                Ok(())
            })
        }
    }

    fn plain_renderer() -> Renderer {
        Renderer::builder(Config::default().with_plugins(Plugins::NONE)).build()
    }

    #[tokio::test]
    async fn test_markdown_with_cloze_and_math() {
        let renderer = plain_renderer();
        let mut doc = Document::parse(
            r#"<div id="qa"><div class="markdown-body original">**Q** <span class="cloze">[...]</span> \(a&lt;b\)</div></div>"#,
        );

        let report = renderer.render(&mut doc).await;
        assert!(report.is_ok());
        assert_eq!(report.state, RenderState::Done);
        assert_eq!(report.stats.markdown_count, 1);
        assert_eq!(report.stats.cloze_count, 1);

        let html = doc.to_html();
        assert!(html.contains(
            r#"<p><strong>Q</strong> <span class="cloze">[...]</span> \(a&lt;b\)</p>"#
        ));
        assert!(html.starts_with(r#"<div id="qa"><div class="markdown-body">"#));
        assert_eq!(renderer.state(), RenderState::Done);
        assert_eq!(renderer.engine_state(BlockKind::Markdown), EngineState::Ready);
    }

    #[tokio::test]
    async fn test_line_breaks_become_hard_breaks() {
        let renderer = plain_renderer();
        let mut doc = Document::parse(r#"<div class="markdown-body">Line1<br>Line2</div>"#);
        renderer.render(&mut doc).await;
        assert!(doc.to_html().contains("Line1<br>\nLine2"));
    }

    #[tokio::test]
    async fn test_static_document_is_revealed() {
        let renderer = plain_renderer();
        let mut doc = Document::parse(r#"<p class="original big">x</p>"#);

        let report = renderer.render(&mut doc).await;
        assert!(report.is_ok());
        assert_eq!(doc.to_html(), r#"<p class="big">x</p>"#);
        assert_eq!(renderer.engine_state(BlockKind::Markdown), EngineState::Uninitialized);
    }

    #[tokio::test]
    async fn test_failing_block_keeps_source() {
        let renderer = Renderer::builder(Config::default())
            .markdown(Arc::new(FussyMarkdown))
            .build();
        let mut doc = Document::parse(
            r#"<div class="markdown-body">boom</div><div class="markdown-body">fine</div>"#,
        );

        let report = renderer.render(&mut doc).await;
        assert_eq!(report.state, RenderState::Failed);
        assert_eq!(report.errors.len(), 1);
        let error = report.errors.iter().next().unwrap();
        assert_eq!((error.stage, error.block), (Stage::Markdown, Some(0)));
        assert_eq!(
            doc.to_html(),
            r#"<div class="markdown-body">boom</div><div class="markdown-body"><p>fine</p></div>"#
        );
    }

    #[tokio::test]
    async fn test_diagram_failure_does_not_stop_mindmaps() {
        let renderer = Renderer::builder(Config::default())
            .diagram(Arc::new(FakeDiagram {
                fail: true,
                ..FakeDiagram::default()
            }))
            .mindmap_view(Arc::new(FakeView))
            .build();
        let mut doc = Document::parse(
            "<pre class=\"mermaid original\">graph</pre><div class=\"markmap original\"># Root\n- a</div>",
        );

        let report = renderer.render(&mut doc).await;
        assert!(report.errors.has_stage(Stage::Diagram));
        assert!(!report.errors.has_stage(Stage::Mindmap));

        let html = doc.to_html();
        assert!(html.contains(r#"<pre class="mermaid">graph</pre>"#));
        assert!(html.contains(r#"<div class="markmap"><svg data-nodes="2"></svg></div>"#));
        assert!(!html.contains("original"));
    }

    #[tokio::test]
    async fn test_mindmap_failure_keeps_source() {
        let renderer = Renderer::builder(Config::default())
            .mindmap_view(Arc::new(FakeView))
            .build();
        let mut doc = Document::parse(
            "<div class=\"markmap\"># broken</div><div class=\"markmap\"># ok</div>",
        );

        let report = renderer.render(&mut doc).await;
        let errors: Vec<_> = report.errors.by_stage(Stage::Mindmap).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].block, Some(0));
        assert_eq!(
            doc.to_html(),
            r#"<div class="markmap"># broken</div><div class="markmap"><svg data-nodes="1"></svg></div>"#
        );
    }

    #[tokio::test]
    async fn test_diagrams_follow_night_mode() {
        let diagram = Arc::new(FakeDiagram::default());
        let renderer = Renderer::builder(Config::default())
            .diagram(diagram.clone())
            .build();
        let mut doc = Document::parse(
            r#"<body class="card nightMode"><pre class="mermaid hidden">A-->B</pre></body>"#,
        );

        assert!(renderer.render(&mut doc).await.is_ok());
        assert_eq!(diagram.theme.lock().as_deref(), Some("dark"));
        assert_eq!(
            doc.to_html(),
            r#"<pre class="mermaid"><svg aria-label="A--&gt;B"></svg></pre>"#
        );
    }

    #[tokio::test]
    async fn test_missing_diagram_renderer_skips_pass() {
        let renderer = plain_renderer();
        let mut doc = Document::parse(r#"<pre class="mermaid">graph</pre>"#);
        assert!(renderer.render(&mut doc).await.is_ok());
        assert_eq!(doc.to_html(), r#"<pre class="mermaid">graph</pre>"#);
    }

    #[tokio::test]
    async fn test_concurrent_render_is_skipped() {
        let diagram = Arc::new(FakeDiagram {
            yield_first: true,
            ..FakeDiagram::default()
        });
        let renderer = Renderer::builder(Config::default())
            .diagram(diagram.clone())
            .build();
        let mut first = Document::parse(r#"<pre class="mermaid original">A</pre>"#);
        let mut second = Document::parse(r#"<pre class="mermaid original">B</pre>"#);

        let (a, b) = tokio::join!(renderer.render(&mut first), renderer.render(&mut second));
        assert!(a.is_ok());
        assert!(b.skipped);
        assert_eq!(diagram.runs.load(Ordering::SeqCst), 1);
        assert_eq!(second.to_html(), r#"<pre class="mermaid original">B</pre>"#);

        // The guard is released afterwards
        assert!(!renderer.render(&mut second).await.skipped);
    }

    #[tokio::test]
    async fn test_too_many_clozes_reveals_unrendered() {
        let renderer = plain_renderer();
        let clozes = r#"<span class="cloze">c</span>"#.repeat(65);
        let mut doc = Document::parse(&format!(
            r#"<div class="markdown-body original">**x** {clozes}</div>"#
        ));

        let report = renderer.render(&mut doc).await;
        assert!(report.errors.has_stage(Stage::Cloze));
        let html = doc.to_html();
        assert!(html.starts_with(r#"<div class="markdown-body">**x** <span class="cloze">c</span>"#));
        assert!(!html.contains('\u{e000}'));
    }

    #[tokio::test]
    async fn test_engine_retries_after_load_failure() {
        let loader = Arc::new(FlakyLoader::default());
        let renderer = Renderer::builder(Config::default().with_plugins(Plugins::NONE))
            .markdown(Arc::new(FussyMarkdown))
            .loader(loader.clone())
            .build();
        let source = r#"<div class="markdown-body">x</div>"#;

        let mut doc = Document::parse(source);
        let report = renderer.render(&mut doc).await;
        assert!(report.errors.has_stage(Stage::Markdown));
        assert_eq!(doc.to_html(), source);
        assert_eq!(renderer.engine_state(BlockKind::Markdown), EngineState::Uninitialized);

        let mut doc = Document::parse(source);
        assert!(renderer.render(&mut doc).await.is_ok());
        assert_eq!(doc.to_html(), r#"<div class="markdown-body"><p>x</p></div>"#);
        assert_eq!(renderer.engine_state(BlockKind::Markdown), EngineState::Ready);
        assert_eq!(renderer.resources().loaded_count(), 2);
    }

    #[tokio::test]
    async fn test_errors_are_written_to_card() {
        let log = DomLog::new(LogLevel::Error);
        let _guard = tracing::subscriber::set_default(Registry::default().with(log.clone()));
        let renderer = Renderer::builder(Config::default())
            .diagram(Arc::new(FakeDiagram {
                fail: true,
                ..FakeDiagram::default()
            }))
            .dom_log(log.clone())
            .build();
        let mut doc = Document::parse(r#"<div id="qa"><pre class="mermaid">x</pre></div>"#);

        renderer.render(&mut doc).await;
        let html = doc.to_html();
        assert!(html.contains(r#"<div id="msgContainer""#));
        assert!(html.contains("diagram rendering failed"));
        assert!(html.contains("Parse error on line 1"));
        assert!(log.entries().is_empty());
    }

    #[tokio::test]
    async fn test_configured_log_level_filters_card_entries() {
        let log = DomLog::new(LogLevel::Debug);
        let _guard = tracing::subscriber::set_default(Registry::default().with(log.clone()));
        let renderer = Renderer::builder(Config::default().with_log_level(LogLevel::Off))
            .diagram(Arc::new(FakeDiagram {
                fail: true,
                ..FakeDiagram::default()
            }))
            .dom_log(log.clone())
            .build();
        assert_eq!(log.level(), LogLevel::Off);

        let mut doc = Document::parse(r#"<div id="qa"><pre class="mermaid">x</pre></div>"#);
        let report = renderer.render(&mut doc).await;
        assert!(report.errors.has_stage(Stage::Diagram));
        assert!(!doc.to_html().contains("msgContainer"));
        assert!(log.entries().is_empty());
    }

    #[tokio::test]
    async fn test_card_symbols_survive_placeholders() {
        let renderer = plain_renderer();
        let mut doc = Document::parse(
            "<div class=\"markdown-body\">\u{e0ff} \\(a\\) \u{e000} <span class=\"cloze\">c</span></div>",
        );

        assert!(renderer.render(&mut doc).await.is_ok());
        assert!(doc.to_html().contains(
            "<p>\u{e0ff} \\(a\\) \u{e000} <span class=\"cloze\">c</span></p>"
        ));
    }

    #[tokio::test]
    async fn test_mindmaps_share_asset_loads() {
        let loader = Arc::new(SlowLoader::default());
        let renderer = Renderer::builder(Config::default())
            .mindmap_view(Arc::new(FakeView))
            .loader(loader.clone())
            .build();
        let mut doc = Document::parse(
            "<div class=\"markmap\"># A\n- $x$</div><div class=\"markmap\"># B\n- $y$</div>",
        );

        assert!(renderer.render(&mut doc).await.is_ok());
        let urls = ResourceUrls::default();
        let calls = loader.calls.lock();
        assert_eq!(calls.iter().filter(|url| **url == urls.katex_css).count(), 1);
        assert_eq!(calls.iter().filter(|url| **url == urls.katex).count(), 1);
    }
}
