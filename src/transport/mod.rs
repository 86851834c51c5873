//! HTTP transport layer.
//!
//! This module sends requests on behalf of a driver and hands back fully
//! read responses. It knows nothing about documents.
//!
//! # Request Lifecycle
//!
//! 1. `Session::resolve` - Turn a path or URL into an absolute URL
//! 2. `OutgoingRequest::build` - Build one attempt (body rebuilt per attempt)
//! 3. `Session::request` - Send, retrying per `RetryPolicy`
//! 4. `RawResponse` - Status, final URL, headers, body bytes
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `request` | Outgoing requests and raw responses |
//! | `retry` | Retry policy |
//! | `session` | Cookie jar, prefix and retry loop |

// ============================================================================
// Submodules
// ============================================================================

/// Outgoing requests and raw responses.
pub mod request;

/// Transport-level retry policy.
pub mod retry;

/// Cookie-keeping HTTP session.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use request::{OutgoingRequest, RawResponse, RequestBody};
pub use retry::{RETRY_STATUS_CODES, RetryPolicy};
pub use session::Session;
