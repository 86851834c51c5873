//! Download capture.
//!
//! A response whose `content-disposition` starts with `attachment` is a
//! download: its body is kept raw and no document is built from it.
//!
//! # Example
//!
//! ```ignore
//! driver.goto("/download/pdf").await?;
//!
//! let download = driver.download().expect("attachment response");
//! assert_eq!(download.filename(), Some("test.pdf"));
//! std::fs::write("out.pdf", download.bytes())?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;

use crate::transport::RawResponse;

use super::core::Driver;

// ============================================================================
// Filename Patterns
// ============================================================================

/// `filename*=charset'lang'percent-encoded` (RFC 6266 / 5987).
static FILENAME_EXT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\*\s*=\s*[^']*'[^']*'([^;\s]+)"#).expect("valid regex")
});

/// `filename="quoted"` or `filename=token`.
static FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\s*=\s*(?:"((?:[^"\\]|\\.)*)"|([^;\s]+))"#).expect("valid regex")
});

// ============================================================================
// Download
// ============================================================================

/// The body of an attachment response, with its suggested filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    bytes: Vec<u8>,
    filename: Option<String>,
    content_type: Option<String>,
}

impl Download {
    /// Captures `raw` if it is an attachment.
    #[must_use]
    pub fn from_response(raw: &RawResponse) -> Option<Self> {
        if !raw.is_attachment() {
            return None;
        }

        Some(Self {
            bytes: raw.body.clone(),
            filename: raw.content_disposition().and_then(parse_filename),
            content_type: raw.content_type().map(str::to_string),
        })
    }

    /// Returns the raw bytes.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the download, returning the raw bytes.
    #[inline]
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Returns the filename suggested by the server.
    #[inline]
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Returns the response content type.
    #[inline]
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the size in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the body is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Extracts the filename from a `content-disposition` value.
///
/// The extended `filename*` form wins over plain `filename`.
fn parse_filename(disposition: &str) -> Option<String> {
    if let Some(encoded) = FILENAME_EXT_PATTERN
        .captures(disposition)
        .and_then(|caps| caps.get(1))
        && let Ok(decoded) = urlencoding::decode(encoded.as_str())
    {
        return Some(decoded.into_owned());
    }

    let caps = FILENAME_PATTERN.captures(disposition)?;
    if let Some(quoted) = caps.get(1) {
        return Some(quoted.as_str().replace("\\\"", "\"").replace("\\\\", "\\"));
    }
    caps.get(2).map(|token| token.as_str().to_string())
}

// ============================================================================
// Driver - Downloads
// ============================================================================

impl Driver {
    /// Returns the body of the last response if it was an attachment.
    ///
    /// `None` before any response and after any non-attachment response.
    #[must_use]
    pub fn get_download(&self) -> Option<&[u8]> {
        self.last_response()
            .map(|response| response.raw())
            .filter(|raw| raw.is_attachment())
            .map(|raw| raw.body.as_slice())
    }

    /// Returns the last response as a [`Download`] if it was an attachment.
    #[must_use]
    pub fn download(&self) -> Option<Download> {
        self.last_response()
            .and_then(|response| Download::from_response(response.raw()))
    }
}

// ============================================================================
// Tests
// ============================================================================
