//! Driver element queries.

use std::sync::Arc;

use tracing::debug;

use crate::document::{Document, Element};
use crate::error::{Error, Result};

use super::core::Driver;

// ============================================================================
// Driver - Elements
// ============================================================================

impl Driver {
    /// Returns the current document.
    ///
    /// `None` before the first HTML response and after any non-HTML one.
    #[inline]
    #[must_use]
    pub fn document(&self) -> Option<&Arc<Document>> {
        self.state.document()
    }

    /// Returns the first element matching `selector`, if any.
    ///
    /// # Errors
    ///
    /// - [`Error::NoDocument`] if no HTML page is loaded
    /// - [`Error::InvalidSelector`] if the selector does not parse
    pub fn query(&self, selector: &str) -> Result<Option<Element>> {
        let element = self.current_document()?.query(selector)?;
        debug!(session_id = %self.id(), selector, found = element.is_some(), "Queried element");
        Ok(element)
    }

    /// Returns every element matching `selector`, in document order.
    ///
    /// # Errors
    ///
    /// - [`Error::NoDocument`] if no HTML page is loaded
    /// - [`Error::InvalidSelector`] if the selector does not parse
    pub fn query_all(&self, selector: &str) -> Result<Vec<Element>> {
        let elements = self.current_document()?.query_all(selector)?;
        debug!(session_id = %self.id(), selector, count = elements.len(), "Queried elements");
        Ok(elements)
    }
}

// ============================================================================
// Driver - Internal
// ============================================================================

impl Driver {
    /// Returns the current document or [`Error::NoDocument`].
    pub(crate) fn current_document(&self) -> Result<Arc<Document>> {
        self.state.document().cloned().ok_or(Error::NoDocument)
    }

    /// Returns the element matching `selector` or [`Error::ElementNotFound`].
    pub(crate) fn require(&self, selector: &str) -> Result<Element> {
        self.query(selector)?
            .ok_or_else(|| Error::element_not_found(selector))
    }
}
