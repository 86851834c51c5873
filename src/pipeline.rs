//! Response pipeline.
//!
//! Every response a driver receives passes through [`ResponsePipeline::process`],
//! which decides whether to build a document, waits for it to settle, and
//! records the result as the session's current state.
//!
//! | Response | Document |
//! |----------|----------|
//! | `text/html`, any status | Built and awaited |
//! | `content-disposition: attachment` | Never built |
//! | Anything else | Never built |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use crate::document::{Document, DocumentEngine, DocumentOptions, ReadyState};
use crate::error::{Error, Result};
use crate::transport::RawResponse;

// ============================================================================
// PageResponse
// ============================================================================

/// A response after the pipeline has run: the raw response plus the
/// document built from it, if any.
#[derive(Debug)]
pub struct PageResponse {
    raw: RawResponse,
    document: Option<Arc<Document>>,
}

impl PageResponse {
    /// Returns the status code.
    #[inline]
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.raw.status
    }

    /// Returns the final URL, after redirects.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.raw.url
    }

    /// Returns the response headers.
    #[inline]
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.raw.headers
    }

    /// Returns the raw body bytes.
    #[inline]
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.raw.body
    }

    /// Returns the underlying raw response.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &RawResponse {
        &self.raw
    }

    /// Returns the document built from this response.
    #[inline]
    #[must_use]
    pub fn document(&self) -> Option<&Arc<Document>> {
        self.document.as_ref()
    }

    /// Returns the body decoded as UTF-8 (lossily).
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw.body).into_owned()
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.raw.body)?)
    }
}

// ============================================================================
// SessionState
// ============================================================================

/// Navigation state of one driver session.
///
/// Only [`ResponsePipeline::process`] changes it; everything else reads.
#[derive(Debug, Default)]
pub struct SessionState {
    current_url: Option<Url>,
    document: Option<Arc<Document>>,
    last_response: Option<Arc<PageResponse>>,
}

impl SessionState {
    /// Returns the URL of the last response.
    #[inline]
    #[must_use]
    pub fn current_url(&self) -> Option<&Url> {
        self.current_url.as_ref()
    }

    /// Returns the current document.
    #[inline]
    #[must_use]
    pub fn document(&self) -> Option<&Arc<Document>> {
        self.document.as_ref()
    }

    /// Returns the last response.
    #[inline]
    #[must_use]
    pub fn last_response(&self) -> Option<&Arc<PageResponse>> {
        self.last_response.as_ref()
    }

    /// Replaces the state with a new response.
    fn record(&mut self, response: Arc<PageResponse>) {
        self.current_url = Some(response.url().clone());
        self.document = response.document().cloned();
        self.last_response = Some(response);
    }
}

// ============================================================================
// ResponsePipeline
// ============================================================================

/// Turns raw responses into page responses and session state.
#[derive(Clone)]
pub struct ResponsePipeline {
    engine: Arc<dyn DocumentEngine>,
    options: DocumentOptions,
    ready_timeout: Duration,
}

impl std::fmt::Debug for ResponsePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponsePipeline")
            .field("options", &self.options)
            .field("ready_timeout", &self.ready_timeout)
            .finish_non_exhaustive()
    }
}

impl ResponsePipeline {
    /// Creates a pipeline.
    #[must_use]
    pub fn new(
        engine: Arc<dyn DocumentEngine>,
        options: DocumentOptions,
        ready_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            options,
            ready_timeout,
        }
    }

    /// Processes a response and records it in `state`.
    ///
    /// HTML bodies become documents whatever the status, so error pages
    /// stay queryable. A document built while scripts are still loading is
    /// awaited before anything is recorded.
    ///
    /// # Errors
    ///
    /// - Any error from the document engine, unchanged
    /// - [`Error::Timeout`] if the document does not become ready within
    ///   the ready timeout
    pub async fn process(
        &self,
        raw: RawResponse,
        state: &mut SessionState,
    ) -> Result<Arc<PageResponse>> {
        let document = if raw.is_html() && !raw.is_attachment() {
            Some(self.materialize(&raw).await?)
        } else {
            None
        };

        debug!(
            url = %raw.url,
            status = raw.status.as_u16(),
            has_document = document.is_some(),
            "Response processed"
        );

        let response = Arc::new(PageResponse { raw, document });
        state.record(Arc::clone(&response));
        Ok(response)
    }

    /// Builds the document for `raw` and waits until it leaves `Loading`.
    async fn materialize(&self, raw: &RawResponse) -> Result<Arc<Document>> {
        let document = self.engine.build(&raw.body, &raw.url, self.options).await?;

        if document.ready_state() == ReadyState::Loading {
            debug!(url = %raw.url, "Waiting for document scripts");
            timeout(self.ready_timeout, document.content_loaded())
                .await
                .map_err(|_| {
                    Error::timeout(
                        format!("content loaded for {}", raw.url),
                        self.ready_timeout.as_millis() as u64,
                    )
                })??;
        }

        Ok(document)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use reqwest::header::HeaderValue;
    use serde_json::Value;

    use crate::document::HtmlEngine;

    /// Builds documents in `Loading` and settles them after `delay`.
    struct DeferredEngine {
        delay: Option<Duration>,
    }

    #[async_trait]
    impl DocumentEngine for DeferredEngine {
        async fn build(
            &self,
            body: &[u8],
            base_url: &Url,
            _options: DocumentOptions,
        ) -> Result<Arc<Document>> {
            let markup = String::from_utf8_lossy(body).into_owned();
            let document = Arc::new(Document::new(base_url.clone(), markup, ReadyState::Loading));

            if let Some(delay) = self.delay {
                let pending = Arc::clone(&document);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    pending.replace_markup("<title>After scripts</title>");
                    pending.set_ready_state(ReadyState::Interactive);
                });
            }

            Ok(document)
        }
    }

    struct FailingEngine;

    #[async_trait]
    impl DocumentEngine for FailingEngine {
        async fn build(&self, _: &[u8], _: &Url, _: DocumentOptions) -> Result<Arc<Document>> {
            Err(Error::document("malformed"))
        }
    }

    fn raw(status: u16, headers: &[(&'static str, &'static str)], body: &str) -> RawResponse {
        let mut map = HeaderMap::new();
        for &(name, value) in headers {
            map.insert(name, HeaderValue::from_static(value));
        }
        RawResponse {
            status: StatusCode::from_u16(status).unwrap(),
            url: Url::parse("http://localhost:3000/page").unwrap(),
            headers: map,
            body: body.as_bytes().to_vec(),
        }
    }

    fn pipeline(engine: Arc<dyn DocumentEngine>) -> ResponsePipeline {
        ResponsePipeline::new(engine, DocumentOptions::default(), Duration::from_secs(2))
    }

    const HTML: (&str, &str) = ("content-type", "text/html; charset=utf-8");

    #[tokio::test]
    async fn test_html_builds_document() {
        let mut state = SessionState::default();
        let response = pipeline(Arc::new(HtmlEngine))
            .process(raw(200, &[HTML], "<title>Home</title>"), &mut state)
            .await
            .unwrap();

        assert_eq!(response.document().unwrap().title(), "Home");
        assert_eq!(state.document().unwrap().title(), "Home");
        assert_eq!(
            state.current_url().map(Url::as_str),
            Some("http://localhost:3000/page")
        );
    }

    #[tokio::test]
    async fn test_error_status_html_is_still_a_document() {
        let mut state = SessionState::default();
        pipeline(Arc::new(HtmlEngine))
            .process(raw(404, &[HTML], "<title>WHAT? Not found</title>"), &mut state)
            .await
            .unwrap();

        assert!(state.document().unwrap().title().starts_with("WHAT?"));
        assert_eq!(state.last_response().unwrap().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_json_passes_through_and_clears_document() {
        let pipeline = pipeline(Arc::new(HtmlEngine));
        let mut state = SessionState::default();

        pipeline
            .process(raw(200, &[HTML], "<title>Home</title>"), &mut state)
            .await
            .unwrap();
        let response = pipeline
            .process(
                raw(200, &[("content-type", "application/json")], r#"{"a":"ok"}"#),
                &mut state,
            )
            .await
            .unwrap();

        assert!(response.document().is_none());
        assert!(state.document().is_none());
        let body: Value = response.json().unwrap();
        assert_eq!(body["a"], "ok");
    }

    #[tokio::test]
    async fn test_attachment_is_never_a_document() {
        let mut state = SessionState::default();
        let response = pipeline(Arc::new(HtmlEngine))
            .process(
                raw(
                    200,
                    &[HTML, ("content-disposition", "attachment; filename=\"page.html\"")],
                    "<title>Download me</title>",
                ),
                &mut state,
            )
            .await
            .unwrap();

        assert!(response.document().is_none());
        assert_eq!(response.text(), "<title>Download me</title>");
    }

    #[tokio::test]
    async fn test_waits_for_loading_document() {
        let engine = DeferredEngine {
            delay: Some(Duration::from_millis(30)),
        };
        let mut state = SessionState::default();
        let response = pipeline(Arc::new(engine))
            .process(raw(200, &[HTML], "<title>Before scripts</title>"), &mut state)
            .await
            .unwrap();

        let document = response.document().unwrap();
        assert_eq!(document.ready_state(), ReadyState::Interactive);
        assert_eq!(document.title(), "After scripts");
    }

    #[tokio::test]
    async fn test_ready_timeout() {
        let engine = DeferredEngine { delay: None };
        let pipeline = ResponsePipeline::new(
            Arc::new(engine),
            DocumentOptions::default(),
            Duration::from_millis(50),
        );
        let mut state = SessionState::default();

        let err = pipeline
            .process(raw(200, &[HTML], "<p>never ready</p>"), &mut state)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(state.last_response().is_none());
    }

    #[tokio::test]
    async fn test_engine_failure_propagates() {
        let mut state = SessionState::default();
        let err = pipeline(Arc::new(FailingEngine))
            .process(raw(200, &[HTML], "<p>x</p>"), &mut state)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Document { .. }));
        assert!(state.current_url().is_none());
    }
}
