//! Outgoing requests and raw responses.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::Result;
use crate::form::{MultipartPayload, Payload};

// ============================================================================
// Constants
// ============================================================================

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

// ============================================================================
// RequestBody
// ============================================================================

/// Body of an outgoing request.
///
/// Kept in a replayable form so each retry attempt can rebuild it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON document.
    Json(Value),
    /// Pre-serialized urlencoded body.
    UrlEncoded(String),
    /// Multipart parts.
    Multipart(MultipartPayload),
}

impl From<Payload> for RequestBody {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::UrlEncoded(payload) => Self::UrlEncoded(payload.to_query_string()),
            Payload::Multipart(payload) => Self::Multipart(payload),
        }
    }
}

// ============================================================================
// OutgoingRequest
// ============================================================================

/// A request, described independently of any one send attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute target URL.
    pub url: Url,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: RequestBody,
    /// Per-request timeout, overriding the session default.
    pub timeout: Option<Duration>,
}

impl OutgoingRequest {
    /// Creates a request with no body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    /// Creates a GET request.
    #[inline]
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Sets the body.
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a header.
    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the timeout.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds one send attempt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) if a multipart part has
    /// an invalid content type.
    pub(crate) fn build(
        &self,
        client: &Client,
        default_timeout: Option<Duration>,
    ) -> Result<RequestBuilder> {
        let mut builder = client.request(self.method.clone(), self.url.clone());

        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        if let Some(timeout) = self.timeout.or(default_timeout) {
            builder = builder.timeout(timeout);
        }

        builder = match &self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::UrlEncoded(body) => builder
                .header(CONTENT_TYPE, FORM_URLENCODED)
                .body(body.clone()),
            RequestBody::Multipart(payload) => builder.multipart(payload.to_form()?),
        };

        Ok(builder)
    }
}

// ============================================================================
// RawResponse
// ============================================================================

/// A fully read response, before any document is built from it.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final status code.
    pub status: StatusCode,
    /// Final URL, after redirects.
    pub url: Url,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Reads a `reqwest` response to the end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) if the body cannot be read.
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(Self {
            status,
            url,
            headers,
            body,
        })
    }

    /// Returns a header value, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns the `content-type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// Returns the `content-disposition` header.
    #[must_use]
    pub fn content_disposition(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
    }

    /// Returns `true` if the content type is HTML.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.content_type()
            .map(|value| value.trim_start().to_ascii_lowercase().starts_with("text/html"))
            .unwrap_or(false)
    }

    /// Returns `true` if the server marked the body as an attachment.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.content_disposition()
            .map(is_attachment_disposition)
            .unwrap_or(false)
    }

    /// Returns `true` for 4xx and 5xx statuses.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status.is_client_error() || self.status.is_server_error()
    }
}

/// Returns `true` if a `content-disposition` value starts with `attachment`.
pub(crate) fn is_attachment_disposition(value: &str) -> bool {
    let value = value.trim_start();
    let Some(prefix) = value.get(.."attachment".len()) else {
        return false;
    };
    if !prefix.eq_ignore_ascii_case("attachment") {
        return false;
    }
    matches!(
        value["attachment".len()..].chars().next(),
        None | Some(';') | Some(' ') | Some('\t')
    )
}

// ============================================================================
// Tests
// ============================================================================
