//! Wire payloads for form submission.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Encoding`] | Declared form encoding |
//! | [`UrlEncodedPayload`] | Ordered name → value(s) mapping |
//! | [`MultipartPayload`] | Ordered sequence of text and file parts |
//! | [`Payload`] | Either of the above |

// ============================================================================
// Imports
// ============================================================================

use reqwest::multipart;
use rustc_hash::FxHashMap;
use tracing::trace;
use url::form_urlencoded;

use crate::document::FormEntry;
use crate::error::Result;

use super::FileDescriptor;

// ============================================================================
// Encoding
// ============================================================================

/// Form encoding, from the `enctype` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// `application/x-www-form-urlencoded`.
    #[default]
    UrlEncoded,
    /// `multipart/form-data`.
    Multipart,
}

impl Encoding {
    /// Maps an `enctype` value to an encoding.
    ///
    /// Only `multipart/form-data` selects multipart; anything else,
    /// including `text/plain`, falls back to urlencoded.
    #[must_use]
    pub fn from_enctype(enctype: Option<&str>) -> Self {
        match enctype {
            Some(value) if value.trim().eq_ignore_ascii_case("multipart/form-data") => {
                Self::Multipart
            }
            _ => Self::UrlEncoded,
        }
    }
}

// ============================================================================
// FieldValue
// ============================================================================

/// Value of a urlencoded field: one value, or every value of a repeated name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Name seen once.
    Single(String),
    /// Name repeated; values in the order encountered.
    Multiple(Vec<String>),
}

impl FieldValue {
    /// Returns every value in order.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::Single(first) => {
                *self = Self::Multiple(vec![std::mem::take(first), value]);
            }
            Self::Multiple(values) => values.push(value),
        }
    }
}

// ============================================================================
// UrlEncodedPayload
// ============================================================================

/// Ordered mapping from field name to value(s).
///
/// Keys keep the position of their first occurrence; repeated names
/// accumulate into [`FieldValue::Multiple`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlEncodedPayload {
    /// Fields in first-seen order.
    fields: Vec<(String, FieldValue)>,
    /// Field name → position in `fields`.
    positions: FxHashMap<String, usize>,
}

impl UrlEncodedPayload {
    /// Creates an empty payload.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a payload from form entries.
    ///
    /// File entries contribute their first filename, or an empty value.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = FormEntry>) -> Self {
        let mut payload = Self::new();
        for entry in entries {
            match entry {
                FormEntry::Text { name, value } => payload.append(name, value),
                FormEntry::File { name, files } => {
                    let filename = files
                        .into_iter()
                        .next()
                        .map(|file| file.filename)
                        .unwrap_or_default();
                    payload.append(name, filename);
                }
            }
        }
        trace!(fields = payload.len(), "Built urlencoded payload");
        payload
    }

    /// Appends a value, accumulating into an array if the name exists.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        if let Some(&position) = self.positions.get(&name) {
            self.fields[position].1.push(value);
            return;
        }

        self.positions.insert(name.clone(), self.fields.len());
        self.fields.push((name, FieldValue::Single(value)));
    }

    /// Returns the value(s) stored for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.positions
            .get(name)
            .map(|&position| &self.fields[position].1)
    }

    /// Returns the fields in order.
    #[must_use]
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Returns the number of distinct field names.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no fields.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flattens to name/value pairs; repeated names become repeated keys.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.fields
            .iter()
            .flat_map(|(name, value)| {
                value
                    .values()
                    .into_iter()
                    .map(move |value| (name.as_str(), value))
            })
            .collect()
    }

    /// Serializes as `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }
}

// ============================================================================
// MultipartPayload
// ============================================================================

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// A text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// A file field.
    File {
        /// Field name.
        name: String,
        /// File content and metadata.
        file: FileDescriptor,
    },
}

impl Part {
    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Ordered sequence of parts; repeated names stay repeated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartPayload {
    parts: Vec<Part>,
}

impl MultipartPayload {
    /// Creates an empty payload.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a payload from form entries.
    ///
    /// Only the first file of a file entry is sent; a file entry with no
    /// files adds no part.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = FormEntry>) -> Self {
        let mut payload = Self::new();
        for entry in entries {
            match entry {
                FormEntry::Text { name, value } => payload.text(name, value),
                FormEntry::File { name, files } => {
                    if let Some(file) = files.into_iter().next() {
                        payload.file(name, file);
                    }
                }
            }
        }
        trace!(parts = payload.parts.len(), "Built multipart payload");
        payload
    }

    /// Appends a text part.
    pub fn text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parts.push(Part::Text {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Appends a file part.
    pub fn file(&mut self, name: impl Into<String>, file: FileDescriptor) {
        self.parts.push(Part::File {
            name: name.into(),
            file,
        });
    }

    /// Returns the parts in order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Builds a `reqwest` multipart form.
    ///
    /// Called once per attempt, since a form body is consumed on send.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) if a file's content
    /// type is not a valid MIME type.
    pub fn to_form(&self) -> Result<multipart::Form> {
        let mut form = multipart::Form::new();

        for part in &self.parts {
            form = match part {
                Part::Text { name, value } => form.text(name.clone(), value.clone()),
                Part::File { name, file } => {
                    let body = multipart::Part::bytes(file.bytes.clone())
                        .file_name(file.filename.clone())
                        .mime_str(&file.content_type)?;
                    form.part(name.clone(), body)
                }
            };
        }

        Ok(form)
    }
}

// ============================================================================
// Payload
// ============================================================================

/// A form submission body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Urlencoded body.
    UrlEncoded(UrlEncodedPayload),
    /// Multipart body.
    Multipart(MultipartPayload),
}

impl Payload {
    /// Builds a payload from collected entries followed by submitter entries.
    ///
    /// Submitter entries are appended after every collected field and
    /// never replace one.
    #[must_use]
    pub fn build(entries: Vec<FormEntry>, encoding: Encoding, submitter: Vec<FormEntry>) -> Self {
        let entries = entries.into_iter().chain(submitter);

        match encoding {
            Encoding::UrlEncoded => Self::UrlEncoded(UrlEncodedPayload::from_entries(entries)),
            Encoding::Multipart => Self::Multipart(MultipartPayload::from_entries(entries)),
        }
    }

    /// Returns the encoding of this payload.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        match self {
            Self::UrlEncoded(_) => Encoding::UrlEncoded,
            Self::Multipart(_) => Encoding::Multipart,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
