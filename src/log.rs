//! On-card log display.
//!
//! The card webview has no console the user can see, so log events are also
//! captured by a tracing [`Layer`] and written into the card itself, inside
//! a `<div id="msgContainer">` under `#qa`.
//!
//! ```ignore
//! let log = DomLog::from_config(&config);
//! let _guard = tracing::subscriber::set_default(Registry::default().with(log.clone()));
//! let renderer = Renderer::builder(config).dom_log(log).build();
//! ```

use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::config::{Config, LogLevel};
use crate::node::{Document, Element};

/// Targets captured by the layer
const CAPTURED_PREFIX: &str = "cardmark";

/// One captured event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

impl LogEntry {
    /// Text color used on the card
    fn color(&self) -> Option<&'static str> {
        match self.level {
            Level::ERROR => Some("red"),
            Level::WARN => Some("orange"),
            _ => None,
        }
    }
}

// =============================================================================
// DomLog
// =============================================================================

/// Tracing layer buffering events for display on the card.
///
/// Clones share the same buffer and level: install one clone as a layer and
/// hand the other to the renderer, which applies [`Config::log_level`].
#[derive(Debug, Clone, Default)]
pub struct DomLog {
    level: Arc<RwLock<LogLevel>>,
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl DomLog {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: Arc::new(RwLock::new(level)),
            entries: Arc::default(),
        }
    }

    /// Log at the level configured in `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.log_level)
    }

    pub fn level(&self) -> LogLevel {
        *self.level.read()
    }

    /// Change the captured level, for every clone
    pub fn set_level(&self, level: LogLevel) {
        *self.level.write() = level;
    }

    /// Snapshot of the buffered entries
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Remove and return the buffered entries
    pub fn take(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Write buffered entries into the document and clear the buffer.
    ///
    /// Entries go into the element with id `container_id`, which is created
    /// and appended to `anchor_id` when missing. Without either element the
    /// entries are dropped. Returns the number of entries written.
    pub fn flush_into(&self, doc: &mut Document, container_id: &str, anchor_id: &str) -> usize {
        let entries = self.take();
        if entries.is_empty() {
            return 0;
        }

        if doc.element_by_id(container_id).is_none() {
            let Some(anchor) = doc.element_by_id_mut(anchor_id) else {
                return 0;
            };
            anchor.push_elem(
                Element::new("div")
                    .with_id(container_id)
                    .attr("style", "text-align: left; white-space: pre-wrap"),
            );
        }

        let Some(container) = doc.element_by_id_mut(container_id) else {
            return 0;
        };
        let count = entries.len();
        for entry in entries {
            container.push_elem(entry_element(&entry));
        }
        count
    }
}

fn entry_element(entry: &LogEntry) -> Element {
    let mut div = Element::new("div");
    if let Some(color) = entry.color() {
        div.set_attr("style", format!("color: {color}"));
    }
    div.push_text(escape_math_delimiters(&entry.message));
    div.push_elem(Element::new("br"));
    div.push_elem(Element::new("hr"));
    div
}

/// Keep the card's math typesetter off log text
fn escape_math_delimiters(message: &str) -> String {
    message.replace("\\(", "\\_(").replace("\\[", "\\_[")
}

impl<S: Subscriber> Layer<S> for DomLog {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with(CAPTURED_PREFIX) || !self.level().allows(metadata.level()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.entries.lock().push(LogEntry {
            level: *metadata.level(),
            message: visitor.finish(),
        });
    }
}

/// Visitor that flattens an event into `message, key=value, ...`
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{}, {}", self.message, self.fields),
        }
    }

    fn separate(&mut self) {
        if !self.fields.is_empty() {
            self.fields.push_str(", ");
        }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            self.separate();
            let _ = write!(self.fields, "{}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.separate();
            let _ = write!(self.fields, "{}={}", field.name(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    fn capture(level: LogLevel, f: impl FnOnce()) -> DomLog {
        let log = DomLog::new(level);
        let subscriber = Registry::default().with(log.clone());
        tracing::subscriber::with_default(subscriber, f);
        log
    }

    #[test]
    fn test_level_filtering() {
        let log = capture(LogLevel::Warn, || {
            tracing::error!("broken");
            tracing::warn!(url = "a.js", "slow");
            tracing::info!("fine");
        });
        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "broken");
        assert_eq!(entries[1].message, "slow, url=a.js");
    }

    #[test]
    fn test_level_is_shared_between_clones() {
        let log = DomLog::from_config(&Config::default().with_log_level(LogLevel::Debug));
        let layer = log.clone();
        log.set_level(LogLevel::Warn);
        assert_eq!(layer.level(), LogLevel::Warn);

        let subscriber = Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("kept");
            tracing::info!("dropped");
        });
        assert_eq!(log.take().len(), 1);
    }

    #[test]
    fn test_off_captures_nothing() {
        let log = capture(LogLevel::Off, || tracing::error!("x"));
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_flush_creates_container_under_anchor() {
        let log = capture(LogLevel::Debug, || {
            tracing::error!(r"bad \(x\) and \[y\]");
            tracing::debug!("a < b");
        });
        let mut doc = Document::parse(r#"<div id="qa"><p>card</p></div>"#);

        assert_eq!(log.flush_into(&mut doc, "msgContainer", "qa"), 2);
        let html = doc.to_html();
        assert!(html.starts_with(
            r#"<div id="qa"><p>card</p><div id="msgContainer" style="text-align: left; white-space: pre-wrap">"#
        ));
        assert!(html.contains(r#"<div style="color: red">bad \_(x\) and \_[y\]<br><hr></div>"#));
        assert!(html.contains("<div>a &lt; b<br><hr></div>"));
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_flush_without_anchor_drops_entries() {
        let log = capture(LogLevel::Error, || tracing::error!("x"));
        let mut doc = Document::parse("<p>card</p>");
        assert_eq!(log.flush_into(&mut doc, "msgContainer", "qa"), 0);
        assert_eq!(doc.to_html(), "<p>card</p>");
    }
}
