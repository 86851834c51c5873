//! Error types for formsurf.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use formsurf::{Driver, Result};
//!
//! async fn example(driver: &mut Driver) -> Result<()> {
//!     driver.goto("/login").await?;
//!     driver.submit_form("#login-form").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidUrl`] |
//! | Selector | [`Error::InvalidSelector`], [`Error::ElementNotFound`], [`Error::NotALink`], [`Error::MissingHref`], [`Error::NotSubmittable`], [`Error::NotAFileInput`], [`Error::NoDocument`] |
//! | Method | [`Error::InvalidMethod`] |
//! | Transport | [`Error::HttpStatus`], [`Error::Timeout`], [`Error::Http`] |
//! | Document | [`Error::Document`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes the selector, URL or status needed to tell
/// which step of a test failed.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when driver options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A navigation target could not be turned into an absolute URL.
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The URL or path as supplied.
        url: String,
        /// Why it could not be resolved.
        message: String,
    },

    // ========================================================================
    // Selector Errors
    // ========================================================================
    /// The CSS selector could not be parsed.
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector {
        /// The selector as supplied.
        selector: String,
        /// Parser message.
        message: String,
    },

    /// The selector matched no element in the current document.
    #[error("Element not found: selector={selector}")]
    ElementNotFound {
        /// CSS selector used.
        selector: String,
    },

    /// A link operation was given something that is not an anchor.
    #[error("{selector} must be a link")]
    NotALink {
        /// CSS selector used.
        selector: String,
    },

    /// The selected anchor has no usable `href`.
    #[error("{selector} must have a href attribute")]
    MissingHref {
        /// CSS selector used.
        selector: String,
    },

    /// A form submission was given something with no form to submit.
    #[error("the selector '{selector}' must select a form, a form field, or a submit button")]
    NotSubmittable {
        /// CSS selector used.
        selector: String,
    },

    /// File injection was given something other than `<input type="file">`.
    #[error("{selector} must be a file input")]
    NotAFileInput {
        /// CSS selector used.
        selector: String,
    },

    /// An element query ran before any HTML page was loaded.
    #[error("No document loaded: navigate to an HTML page first")]
    NoDocument,

    // ========================================================================
    // Method Errors
    // ========================================================================
    /// The JSON helper was asked to send a body with an unsupported method.
    #[error("method must be POST or PUT, got {method}")]
    InvalidMethod {
        /// The rejected method.
        method: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// The server answered with a client or server error status.
    ///
    /// The response has already been recorded, so an HTML error page is
    /// still queryable through the driver.
    #[error("Response code {status} for {url}")]
    HttpStatus {
        /// The original status code.
        status: u16,
        /// Final URL of the response.
        url: String,
    },

    /// Operation timeout.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Connection or protocol failure from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // ========================================================================
    // Document Errors
    // ========================================================================
    /// The document engine failed to build or settle a document.
    #[error("Document error: {message}")]
    Document {
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid selector error.
    #[inline]
    pub fn invalid_selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Creates an element not found error.
    #[inline]
    pub fn element_not_found(selector: impl Into<String>) -> Self {
        Self::ElementNotFound {
            selector: selector.into(),
        }
    }

    /// Creates a not-a-link error.
    #[inline]
    pub fn not_a_link(selector: impl Into<String>) -> Self {
        Self::NotALink {
            selector: selector.into(),
        }
    }

    /// Creates a missing href error.
    #[inline]
    pub fn missing_href(selector: impl Into<String>) -> Self {
        Self::MissingHref {
            selector: selector.into(),
        }
    }

    /// Creates a not-submittable error.
    #[inline]
    pub fn not_submittable(selector: impl Into<String>) -> Self {
        Self::NotSubmittable {
            selector: selector.into(),
        }
    }

    /// Creates a not-a-file-input error.
    #[inline]
    pub fn not_a_file_input(selector: impl Into<String>) -> Self {
        Self::NotAFileInput {
            selector: selector.into(),
        }
    }

    /// Creates an invalid method error.
    #[inline]
    pub fn invalid_method(method: impl Into<String>) -> Self {
        Self::InvalidMethod {
            method: method.into(),
        }
    }

    /// Creates an HTTP status error.
    #[inline]
    pub fn http_status(status: u16, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a document error.
    #[inline]
    pub fn document(message: impl Into<String>) -> Self {
        Self::Document {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` if the selected element was the wrong kind, missing,
    /// or the selector itself was unusable.
    #[inline]
    #[must_use]
    pub fn is_selector_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSelector { .. }
                | Self::ElementNotFound { .. }
                | Self::NotALink { .. }
                | Self::MissingHref { .. }
                | Self::NotSubmittable { .. }
                | Self::NotAFileInput { .. }
                | Self::NoDocument
        )
    }

    /// Returns `true` if the request failed on the wire or with an error status.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus { .. } | Self::Timeout { .. } | Self::Http(_)
        )
    }

    /// Returns the HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::http_status(404, "http://localhost/missing");
        assert_eq!(
            err.to_string(),
            "Response code 404 for http://localhost/missing"
        );
    }

    #[test]
    fn test_not_submittable_names_selector() {
        let err = Error::not_submittable("#nav");
        assert_eq!(
            err.to_string(),
            "the selector '#nav' must select a form, a form field, or a submit button"
        );
    }

    #[test]
    fn test_is_selector_error() {
        assert!(Error::not_a_link("p").is_selector_error());
        assert!(Error::not_a_file_input("#name").is_selector_error());
        assert!(Error::NoDocument.is_selector_error());
        assert!(!Error::invalid_method("PATCH").is_selector_error());
    }

    #[test]
    fn test_is_transport_error() {
        assert!(Error::http_status(500, "http://x/").is_transport_error());
        assert!(Error::timeout("GET http://x/", 10).is_transport_error());
        assert!(!Error::document("bad").is_transport_error());
    }

    #[test]
    fn test_status() {
        assert_eq!(Error::http_status(503, "http://x/").status(), Some(503));
        assert_eq!(Error::config("test").status(), None);
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::timeout("content loaded", 5000);
        let other_err = Error::config("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
