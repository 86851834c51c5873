//! formsurf - Headless scriptable browsing for HTTP integration tests.
//!
//! This library drives a web application the way a test user would:
//! navigate, read the page through CSS selectors, fill in and submit forms,
//! upload files and capture downloads, all without a real browser.
//!
//! # Architecture
//!
//! Each [`Driver`] is one isolated session:
//!
//! - **Transport**: a `reqwest` client with its own cookie jar, redirect
//!   limit, retry policy and optional prefix URL
//! - **Pipeline**: every response is recorded; HTML responses that are not
//!   attachments become the current [`Document`]
//! - **Document**: a parsed page with live form-control state, queried by
//!   CSS selector and built by a pluggable [`DocumentEngine`]
//! - **Forms**: the selected form is serialized from the live document as
//!   urlencoded or multipart and sent with the declared method
//!
//! Error pages (4xx/5xx HTML) still become the current document, so tests
//! can inspect them after the [`Error::HttpStatus`] is returned.
//!
//! # Quick Start
//!
//! ```ignore
//! use formsurf::{Driver, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut driver = Driver::builder()
//!         .prefix_url("http://localhost:3000")
//!         .build()?;
//!
//!     driver.goto("/").await?;
//!
//!     let input = driver.query("[data-test-id=\"input2\"]")?.expect("input2");
//!     input.set_value("hello");
//!     driver.submit_form("[data-test-id=\"submit2\"]").await?;
//!
//!     let title = driver.document().map(|doc| doc.title());
//!     println!("Page title: {title:?}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`driver`] | Session entry point and configuration |
//! | [`document`] | Parsed pages, elements and document engines |
//! | [`form`] | Form resolution, payloads and file descriptors |
//! | [`pipeline`] | Response recording and document materialization |
//! | [`transport`] | HTTP session, requests and retry policy |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Parsed documents and elements.
///
/// - [`Document`] - One materialized page
/// - [`Element`] - Handle to one element of a document
/// - [`DocumentEngine`] - Turns HTML into a [`Document`]
pub mod document;

/// Driver factory and configuration.
///
/// Use [`Driver::builder()`] to create a configured driver instance.
pub mod driver;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Form resolution and payload encoding.
pub mod form;

/// Type-safe identifiers.
pub mod identifiers;

/// Response recording and document materialization.
pub mod pipeline;

/// HTTP transport layer.
///
/// Session state, request descriptions and retry policy.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Document types
pub use document::{
    Document, DocumentEngine, DocumentOptions, Element, ElementKind, FormEntry, HtmlEngine,
    ReadyState,
};

// Driver types
pub use driver::{Download, Driver, DriverBuilder, DriverOptions};

// Error types
pub use error::{Error, Result};

// Form types
pub use form::{Encoding, FileDescriptor, MultipartPayload, Payload, UrlEncodedPayload};

// Identifier types
pub use identifiers::SessionId;

// Pipeline types
pub use pipeline::PageResponse;

// Transport types
pub use transport::RetryPolicy;
