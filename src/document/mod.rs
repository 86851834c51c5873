//! In-memory, queryable documents.
//!
//! A [`Document`] is what a navigation produces when the server answers
//! with HTML. It is built by a [`DocumentEngine`] and handed out as an
//! `Arc<Document>`; [`Element`] handles point back into it.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Document`] | Parsed page plus per-control state (values, checks, files) |
//! | [`DocumentEngine`] | Boundary to the HTML engine |
//! | [`HtmlEngine`] | Default engine, backed by `scraper` |
//! | [`Element`] | Handle to one element of a document |
//! | [`ElementKind`] | Capability tag an element is classified into |
//! | [`FormEntry`] | One entry of a form's data set |
//!
//! # Example
//!
//! ```ignore
//! let document = driver.document().expect("an HTML page is loaded");
//!
//! assert_eq!(document.title(), "Test Express App");
//! let links = document.query_all("a[href]")?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod element;
mod engine;
mod entries;

// ============================================================================
// Imports
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::watch;
use url::Url;

use crate::error::{Error, Result};

use element::ControlState;

// ============================================================================
// Re-exports
// ============================================================================

pub use element::{Element, ElementKind};
pub use engine::{DocumentEngine, DocumentOptions, HtmlEngine};
pub use entries::FormEntry;

// ============================================================================
// Parse Cache
// ============================================================================

/// Source of document identities for the parse cache.
static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// Last tree parsed on this thread: (document id, markup version, tree).
    static PARSED: RefCell<Option<(u64, u64, Rc<Html>)>> = const { RefCell::new(None) };
}

#[cfg(test)]
thread_local! {
    static PARSE_COUNT: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

// ============================================================================
// ReadyState
// ============================================================================

/// Loading state of a document, as `document.readyState` reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadyState {
    /// Still parsing or waiting on external scripts.
    Loading,
    /// Parsed and scripts have run; `DOMContentLoaded` has fired.
    Interactive,
    /// Every subresource has finished loading.
    Complete,
}

impl ReadyState {
    /// Returns the DOM spelling of this state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Interactive => "interactive",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Document
// ============================================================================

/// A parsed HTML page.
///
/// `scraper` trees are neither `Send` nor `Sync`, so the document keeps
/// its markup and each thread caches the last tree it parsed. Repeated
/// reads of one document on one thread parse it once; switching between
/// documents, or replacing the markup, costs a fresh parse. Elements are
/// addressed by their position in tree order, which is stable for a given
/// markup.
pub struct Document {
    /// Identity for the parse cache.
    id: u64,
    /// URL the document was loaded from.
    url: Url,
    /// Current markup.
    markup: RwLock<String>,
    /// Bumped on every markup replacement.
    version: AtomicU64,
    /// Control state keyed by element position.
    controls: Mutex<FxHashMap<usize, ControlState>>,
    /// Ready state channel; `content_loaded` waits on it.
    ready: watch::Sender<ReadyState>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url.as_str())
            .field("ready_state", &self.ready_state())
            .field("markup_len", &self.markup.read().len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Document - Constructor
// ============================================================================

impl Document {
    /// Creates a document from markup.
    ///
    /// Engines that still have scripts to run pass [`ReadyState::Loading`]
    /// and call [`set_ready_state`](Self::set_ready_state) once they finish.
    #[must_use]
    pub fn new(url: Url, markup: impl Into<String>, ready_state: ReadyState) -> Self {
        let (ready, _) = watch::channel(ready_state);
        Self {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            url,
            markup: RwLock::new(markup.into()),
            version: AtomicU64::new(0),
            controls: Mutex::new(FxHashMap::default()),
            ready,
        }
    }
}

// ============================================================================
// Document - Accessors
// ============================================================================

impl Document {
    /// Returns the URL the document was loaded from.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the base URL used to resolve relative links and actions.
    ///
    /// This is the first `<base href>` when present, otherwise the
    /// document URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        self.with_html(|html| base_url_of(html, &self.url))
    }

    /// Returns the text of the `<title>` element, or an empty string.
    #[must_use]
    pub fn title(&self) -> String {
        self.with_html(|html| {
            elements(html)
                .find(|el| el.value().name() == "title")
                .map(|el| el.text().collect::<String>())
                .unwrap_or_default()
        })
    }

    /// Returns a copy of the current markup.
    #[must_use]
    pub fn markup(&self) -> String {
        self.markup.read().clone()
    }

    /// Replaces the markup, as an engine does after scripts mutate the tree.
    ///
    /// Control state is cleared; element handles taken before the
    /// replacement no longer point at the same elements.
    pub fn replace_markup(&self, markup: impl Into<String>) {
        let mut current = self.markup.write();
        *current = markup.into();
        self.version.fetch_add(1, Ordering::AcqRel);
        drop(current);
        self.controls.lock().clear();
    }
}

// ============================================================================
// Document - Readiness
// ============================================================================

impl Document {
    /// Returns the current ready state.
    #[inline]
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        *self.ready.borrow()
    }

    /// Updates the ready state, waking anyone waiting in
    /// [`content_loaded`](Self::content_loaded).
    pub fn set_ready_state(&self, state: ReadyState) {
        self.ready.send_replace(state);
    }

    /// Waits until the document has left [`ReadyState::Loading`].
    ///
    /// Resolves immediately when the document is already interactive or
    /// complete.
    pub async fn content_loaded(&self) -> Result<()> {
        let mut rx = self.ready.subscribe();
        rx.wait_for(|state| *state != ReadyState::Loading)
            .await
            .map(|_| ())
            .map_err(|_| Error::document("ready state channel closed while loading"))
    }
}

// ============================================================================
// Document - Queries
// ============================================================================

impl Document {
    /// Returns the first element matching `selector`, in tree order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not parse.
    pub fn query(self: &Arc<Self>, selector: &str) -> Result<Option<Element>> {
        let parsed = parse_selector(selector)?;
        let index = self.with_html(|html| elements(html).position(|el| parsed.matches(&el)));
        Ok(index.map(|index| Element::new(Arc::clone(self), index)))
    }

    /// Returns every element matching `selector`, in tree order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the selector does not parse.
    pub fn query_all(self: &Arc<Self>, selector: &str) -> Result<Vec<Element>> {
        let parsed = parse_selector(selector)?;
        let indices: Vec<usize> = self.with_html(|html| {
            elements(html)
                .enumerate()
                .filter(|(_, el)| parsed.matches(el))
                .map(|(index, _)| index)
                .collect()
        });

        Ok(indices
            .into_iter()
            .map(|index| Element::new(Arc::clone(self), index))
            .collect())
    }
}

// ============================================================================
// Document - Internal
// ============================================================================

impl Document {
    /// Runs `f` against the parsed tree, parsing only on a cache miss.
    pub(crate) fn with_html<R>(&self, f: impl FnOnce(&Html) -> R) -> R {
        let html = {
            let markup = self.markup.read();
            let version = self.version.load(Ordering::Acquire);

            let cached = PARSED.with_borrow(|parsed| match parsed {
                Some((id, seen, html)) if *id == self.id && *seen == version => {
                    Some(Rc::clone(html))
                }
                _ => None,
            });

            match cached {
                Some(html) => html,
                None => {
                    #[cfg(test)]
                    PARSE_COUNT.set(PARSE_COUNT.get() + 1);

                    let html = Rc::new(Html::parse_document(&markup));
                    PARSED.set(Some((self.id, version, Rc::clone(&html))));
                    html
                }
            }
        };

        f(&html)
    }

    /// Locks the control state map.
    pub(crate) fn controls(&self) -> parking_lot::MutexGuard<'_, FxHashMap<usize, ControlState>> {
        self.controls.lock()
    }
}

// ============================================================================
// Tree Helpers
// ============================================================================

/// Iterates every element of the tree in document order.
pub(crate) fn elements(html: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    html.tree.root().descendants().filter_map(ElementRef::wrap)
}

/// Returns the element at `index` in document order.
pub(crate) fn element_at(html: &Html, index: usize) -> Option<ElementRef<'_>> {
    elements(html).nth(index)
}

/// Returns the document-order position of `element`.
pub(crate) fn index_of(html: &Html, element: &ElementRef<'_>) -> Option<usize> {
    elements(html).position(|el| el.id() == element.id())
}

/// Resolves the document base URL from the first `<base href>`.
pub(crate) fn base_url_of(html: &Html, url: &Url) -> Url {
    elements(html)
        .find(|el| el.value().name() == "base" && el.value().attr("href").is_some())
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| url.join(href.trim()).ok())
        .unwrap_or_else(|| url.clone())
}

/// Parses a CSS selector, naming it in the error.
pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::invalid_selector(selector, format!("{e:?}")))
}

// ============================================================================
// Tests
// ============================================================================
