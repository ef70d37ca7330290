//! Engine resource loading
//!
//! Engines running in the card webview need their scripts and stylesheets
//! attached first. The host supplies a [`ResourceLoader`] that does the
//! attaching; [`Resources`] adds memoization on top so a URL is fetched at
//! most once per renderer, even when several passes ask for it at once.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared, join_all};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, error, info};

use crate::error::LoadError;
use crate::node::Element;

// =============================================================================
// ResourceKind
// =============================================================================

/// Kind of an external resource, from its URL suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Script,
    Stylesheet,
}

impl ResourceKind {
    /// `.js` is a script, `.css` a stylesheet; anything else is rejected.
    pub fn from_url(url: &str) -> Result<Self, LoadError> {
        if url.ends_with(".js") {
            Ok(Self::Script)
        } else if url.ends_with(".css") {
            Ok(Self::Stylesheet)
        } else {
            Err(LoadError::Unsupported(url.to_string()))
        }
    }

    /// Element that loads `url` when attached to the page head
    pub fn element(&self, url: &str) -> Element {
        match self {
            Self::Script => Element::new("script").attr("src", url),
            Self::Stylesheet => Element::new("link").attr("rel", "stylesheet").attr("href", url),
        }
    }
}

// =============================================================================
// ResourceLoader
// =============================================================================

/// Attaches a resource to the page and resolves when it has loaded
pub trait ResourceLoader: Send + Sync {
    fn load<'a>(&'a self, url: &'a str, kind: ResourceKind) -> BoxFuture<'a, Result<(), LoadError>>;
}

/// Loader for native engines that need nothing attached
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLoader;

impl ResourceLoader for NoopLoader {
    fn load<'a>(&'a self, _url: &'a str, _kind: ResourceKind) -> BoxFuture<'a, Result<(), LoadError>> {
        Box::pin(async { Ok(()) })
    }
}

// =============================================================================
// Resources
// =============================================================================

type PendingLoad = Shared<BoxFuture<'static, Result<(), LoadError>>>;

/// Memoizing front of a [`ResourceLoader`]
pub struct Resources {
    loader: Arc<dyn ResourceLoader>,
    loaded: Mutex<FxHashSet<String>>,
    /// Loads in flight; concurrent requests for a URL await the same one
    pending: Mutex<FxHashMap<String, PendingLoad>>,
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resources")
            .field("loaded", &self.loaded.lock().len())
            .field("pending", &self.pending.lock().len())
            .finish_non_exhaustive()
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::new(Arc::new(NoopLoader))
    }
}

impl Resources {
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            loader,
            loaded: Mutex::new(FxHashSet::default()),
            pending: Mutex::new(FxHashMap::default()),
        }
    }

    /// Check if `url` has loaded successfully before
    pub fn is_loaded(&self, url: &str) -> bool {
        self.loaded.lock().contains(url)
    }

    /// Number of loaded resources
    pub fn loaded_count(&self) -> usize {
        self.loaded.lock().len()
    }

    /// Load one resource, unless it is already loaded.
    ///
    /// Callers arriving while the same URL is loading wait for that load
    /// instead of starting another. A failed load is not remembered, so the
    /// next call retries.
    pub async fn load(&self, url: &str) -> Result<(), LoadError> {
        let kind = ResourceKind::from_url(url)?;
        let load = {
            let mut pending = self.pending.lock();
            // Checked under the pending lock: a finished load is marked
            // loaded before it leaves the pending map
            if self.is_loaded(url) {
                debug!(url, "resource already loaded");
                return Ok(());
            }
            match pending.get(url) {
                Some(load) => {
                    debug!(url, "resource already loading");
                    load.clone()
                }
                None => {
                    let load = self.start(url, kind);
                    pending.insert(url.to_string(), load.clone());
                    load
                }
            }
        };

        let result = load.clone().await;
        self.settle(url, &load, &result);
        result
    }

    fn start(&self, url: &str, kind: ResourceKind) -> PendingLoad {
        let loader = Arc::clone(&self.loader);
        let url = url.to_string();
        let load: BoxFuture<'static, Result<(), LoadError>> =
            Box::pin(async move { loader.load(&url, kind).await });
        load.shared()
    }

    /// Record the outcome of `load`, once, whichever waiter finishes first
    fn settle(&self, url: &str, load: &PendingLoad, result: &Result<(), LoadError>) {
        let mut pending = self.pending.lock();
        if !pending.get(url).is_some_and(|current| current.ptr_eq(load)) {
            return;
        }
        pending.remove(url);
        match result {
            Ok(()) => {
                self.loaded.lock().insert(url.to_string());
                info!(url, "resource loaded");
            }
            Err(e) => error!(url, error = %e, "failed to load resource"),
        }
    }

    /// Load several resources concurrently.
    ///
    /// Duplicate URLs are loaded once. Every load runs to completion; the
    /// first failure in input order is returned.
    pub async fn load_all(&self, urls: &[String]) -> Result<(), LoadError> {
        let mut seen = FxHashSet::default();
        let unique: Vec<&str> = urls
            .iter()
            .map(String::as_str)
            .filter(|url| seen.insert(*url))
            .collect();

        let results = join_all(unique.into_iter().map(|url| self.load(url))).await;
        results.into_iter().collect()
    }

    /// Load groups one after another, each group concurrently.
    ///
    /// Stops at the first group that fails.
    pub async fn load_groups(&self, groups: &[Vec<String>]) -> Result<(), LoadError> {
        for group in groups {
            self.load_all(group).await?;
        }
        Ok(())
    }
}
