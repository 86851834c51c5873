//! Synthetic files for file inputs.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Content type used when none can be guessed.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// ============================================================================
// FileDescriptor
// ============================================================================

/// A file as a file input carries it: raw bytes, a name and a content type.
#[derive(Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Full file content.
    pub bytes: Vec<u8>,
    /// Filename sent in the multipart `Content-Disposition`.
    pub filename: String,
    /// Content type sent for the file part.
    pub content_type: String,
}

impl fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl FileDescriptor {
    /// Creates a descriptor from in-memory bytes.
    #[must_use]
    pub fn new(
        bytes: impl Into<Vec<u8>>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }

    /// Reads a file from disk.
    ///
    /// The filename is the path's last component and the content type is
    /// guessed from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = guess_content_type(&filename);

        debug!(path = %path.display(), len = bytes.len(), content_type, "Read file");

        Ok(Self::new(bytes, filename, content_type))
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl FileDescriptor {
    /// Returns the file size in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the file has no content.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ============================================================================
// Content Type Guessing
// ============================================================================

/// Guesses a content type from a filename extension.
#[must_use]
pub fn guess_content_type(filename: &str) -> &'static str {
    let Some((_, extension)) = filename.rsplit_once('.') else {
        return DEFAULT_CONTENT_TYPE;
    };

    match extension.to_ascii_lowercase().as_str() {
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "js" => "text/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_new() {
        let file = FileDescriptor::new(b"hello".to_vec(), "testFile2.jpg", "image/jpg");
        assert_eq!(file.filename, "testFile2.jpg");
        assert_eq!(file.content_type, "image/jpg");
        assert_eq!(file.len(), 5);
        assert!(!file.is_empty());
    }

    #[test]
    fn test_debug_omits_bytes() {
        let file = FileDescriptor::new(vec![0u8; 1024], "big.bin", DEFAULT_CONTENT_TYPE);
        let debug = format!("{file:?}");
        assert!(debug.contains("len: 1024"));
        assert!(!debug.contains("[0, 0"));
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("a.PDF"), "application/pdf");
        assert_eq!(guess_content_type("photo.jpeg"), "image/jpeg");
        assert_eq!(guess_content_type("notes.txt"), "text/plain");
        assert_eq!(guess_content_type("README"), DEFAULT_CONTENT_TYPE);
        assert_eq!(guess_content_type("archive.unknown"), DEFAULT_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testFile1.txt");
        let mut handle = std::fs::File::create(&path).unwrap();
        handle.write_all(b"file contents").unwrap();

        let file = FileDescriptor::from_path(&path).await.unwrap();
        assert_eq!(file.filename, "testFile1.txt");
        assert_eq!(file.content_type, "text/plain");
        assert_eq!(file.bytes, b"file contents");
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileDescriptor::from_path(dir.path().join("missing.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
