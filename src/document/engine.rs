//! Document engine boundary.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::Result;

use super::{Document, ReadyState};

// ============================================================================
// DocumentOptions
// ============================================================================

/// Per-document build options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Let the engine load and run embedded and external scripts.
    pub allow_scripts: bool,
}

// ============================================================================
// DocumentEngine
// ============================================================================

/// Builds documents from response bodies.
///
/// An engine that runs scripts returns its document in
/// [`ReadyState::Loading`] and flips it to `Interactive` once the scripts
/// have executed; the response pipeline waits for that before handing the
/// document to callers.
///
/// Build failures propagate to the caller unchanged.
#[async_trait]
pub trait DocumentEngine: Send + Sync {
    /// Builds a document from `body`, resolving relative URLs against `base_url`.
    async fn build(
        &self,
        body: &[u8],
        base_url: &Url,
        options: DocumentOptions,
    ) -> Result<Arc<Document>>;
}

// ============================================================================
// HtmlEngine
// ============================================================================

/// Static HTML engine backed by `scraper` (html5ever).
///
/// Scripts are never executed, so documents are always built `Complete`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEngine;

#[async_trait]
impl DocumentEngine for HtmlEngine {
    async fn build(
        &self,
        body: &[u8],
        base_url: &Url,
        options: DocumentOptions,
    ) -> Result<Arc<Document>> {
        if options.allow_scripts {
            debug!(url = %base_url, "Script execution requested; HtmlEngine builds a static document");
        }

        let markup = String::from_utf8_lossy(body).into_owned();
        debug!(url = %base_url, bytes = body.len(), "Building document");

        Ok(Arc::new(Document::new(
            base_url.clone(),
            markup,
            ReadyState::Complete,
        )))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_html_engine_builds_complete_document() {
        let url = Url::parse("http://localhost/").unwrap();
        let doc = HtmlEngine
            .build(b"<title>Hi</title>", &url, DocumentOptions::default())
            .await
            .unwrap();

        assert_eq!(doc.ready_state(), ReadyState::Complete);
        assert_eq!(doc.title(), "Hi");
        assert_eq!(doc.url(), &url);
    }

    #[tokio::test]
    async fn test_html_engine_decodes_invalid_utf8_lossily() {
        let url = Url::parse("http://localhost/").unwrap();
        let doc = HtmlEngine
            .build(b"<title>caf\xe9</title>", &url, DocumentOptions { allow_scripts: true })
            .await
            .unwrap();

        assert!(doc.title().starts_with("caf"));
    }
}
