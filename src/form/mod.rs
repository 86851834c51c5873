//! Form resolution and submission encoding.
//!
//! Turns a selector into a form plus an optional submit control, then into
//! the request a browser would send for it.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ResolvedForm`] | Form element and implied submitter |
//! | [`Submission`] | Method, action URL and body of one submission |
//! | [`Payload`] | Urlencoded or multipart body |
//! | [`FileDescriptor`] | File content for file inputs |
//!
//! # Example
//!
//! ```ignore
//! let resolved = ResolvedForm::resolve(&document, "[data-test-id=\"submit2\"]")?;
//! let submission = resolved.submission()?;
//!
//! assert_eq!(submission.method, reqwest::Method::POST);
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod file;
mod payload;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use reqwest::Method;
use tracing::debug;
use url::Url;

use crate::document::{Document, Element, ElementKind, FormEntry};
use crate::error::{Error, Result};

// ============================================================================
// Re-exports
// ============================================================================

pub use file::{FileDescriptor, guess_content_type};
pub use payload::{Encoding, FieldValue, MultipartPayload, Part, Payload, UrlEncodedPayload};

// ============================================================================
// ResolvedForm
// ============================================================================

/// A form and the control that submits it.
///
/// Resolved fresh for every submission; never cache one across
/// navigations or control edits.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedForm {
    /// The form being submitted.
    pub form: Element,
    /// The button or submit input that was selected, if any.
    pub submitter: Option<Element>,
}

impl ResolvedForm {
    /// Resolves `selector` against `document`.
    ///
    /// - A form resolves to itself with no submitter.
    /// - A control with a form owner resolves to that form; buttons and
    ///   submit inputs also become the submitter.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSelector`] if the selector does not parse
    /// - [`Error::ElementNotFound`] if nothing matches
    /// - [`Error::NotSubmittable`] for anything else
    pub fn resolve(document: &Arc<Document>, selector: &str) -> Result<Self> {
        let element = document
            .query(selector)?
            .ok_or_else(|| Error::element_not_found(selector))?;

        let resolved = match element.kind() {
            ElementKind::Form => Self {
                form: element,
                submitter: None,
            },
            kind if kind.is_form_associated() => {
                let form = element
                    .form()
                    .ok_or_else(|| Error::not_submittable(selector))?;
                let submitter = (kind == ElementKind::SubmitControl).then_some(element);
                Self { form, submitter }
            }
            _ => return Err(Error::not_submittable(selector)),
        };

        debug!(
            selector,
            has_submitter = resolved.submitter.is_some(),
            "Resolved form"
        );

        Ok(resolved)
    }
}

// ============================================================================
// ResolvedForm - Effective Attributes
// ============================================================================

impl ResolvedForm {
    /// Returns a submitter override if present, else the form attribute.
    fn effective_attr(&self, submitter_attr: &str, form_attr: &str) -> Option<String> {
        self.submitter
            .as_ref()
            .and_then(|submitter| submitter.attr(submitter_attr))
            .or_else(|| self.form.attr(form_attr))
    }

    /// Returns the effective encoding (`formenctype`, then `enctype`).
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        Encoding::from_enctype(self.effective_attr("formenctype", "enctype").as_deref())
    }

    /// Returns the effective method (`formmethod`, then `method`).
    ///
    /// `get` selects GET; every other value submits via POST.
    #[must_use]
    pub fn method(&self) -> Method {
        match self.effective_attr("formmethod", "method") {
            Some(method) if method.trim().eq_ignore_ascii_case("get") => Method::GET,
            _ => Method::POST,
        }
    }

    /// Returns the absolute action URL (`formaction`, then `action`).
    ///
    /// A missing or empty action targets the document URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the action cannot be resolved.
    pub fn action(&self) -> Result<Url> {
        let document = self.form.document();

        match self.effective_attr("formaction", "action") {
            Some(action) if !action.trim().is_empty() => document
                .base_url()
                .join(action.trim())
                .map_err(|e| Error::invalid_url(action.trim(), e.to_string())),
            _ => Ok(document.url().clone()),
        }
    }

    /// Returns the collected form entries followed by the submitter's.
    #[must_use]
    pub fn entries(&self) -> (Vec<FormEntry>, Vec<FormEntry>) {
        let submitter = self
            .submitter
            .as_ref()
            .map(Element::submitter_entries)
            .unwrap_or_default();
        (self.form.form_entries(), submitter)
    }

    /// Builds the request this form submits.
    ///
    /// GET forms are always urlencoded and replace the action's query;
    /// everything else is sent as a POST body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the action cannot be resolved.
    pub fn submission(&self) -> Result<Submission> {
        let method = self.method();
        let mut url = self.action()?;
        let (entries, submitter) = self.entries();

        if method == Method::GET {
            let query = UrlEncodedPayload::from_entries(entries.into_iter().chain(submitter));
            url.set_fragment(None);
            url.set_query(Some(&query.to_query_string()));

            return Ok(Submission {
                method,
                url,
                payload: None,
            });
        }

        let payload = Payload::build(entries, self.encoding(), submitter);
        Ok(Submission {
            method,
            url,
            payload: Some(payload),
        })
    }
}

// ============================================================================
// Submission
// ============================================================================

/// One form submission, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// HTTP method.
    pub method: Method,
    /// Absolute target URL (carrying the query for GET).
    pub url: Url,
    /// Request body; `None` for GET.
    pub payload: Option<Payload>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::document::ReadyState;

    const PAGE: &str = r#"<!DOCTYPE html>
        <html><body>
        <a id="link1" href="/link1Destination">Link 1</a>
        <form data-test-id="form1" action="/form1Destination" method="POST">
            <input data-test-id="input1" name="input1" value="">
            <input type="submit" data-test-id="submit1" name="submit1" value="Submit 1">
        </form>
        <form data-test-id="form2" action="form2Destination" method="post">
            <input data-test-id="input2" name="input2">
            <button data-test-id="submit2" name="submit2" value="Submit 2">Submit</button>
            <button data-test-id="alt" name="alt" value="Alt"
                formaction="/elsewhere" formenctype="multipart/form-data">Alt</button>
        </form>
        <form data-test-id="upload" action="/file-upload" method="POST" enctype="multipart/form-data">
            <input type="file" data-test-id="file" name="file_field">
        </form>
        <form data-test-id="search" action="/search?old=1#frag" method="get">
            <input name="q" value="rust lang">
            <button name="go" value="1">Go</button>
        </form>
        <form data-test-id="self"><input name="x" value="y"></form>
        <form data-test-id="plain" action="/plain" method="post">
            <input name="a" value="1">
            <button type="button" data-test-id="plain-button" name="btn" value="clicked">B</button>
            <input type="submit" data-test-id="plain-submit" name="sub" value="orig">
        </form>
        <input data-test-id="orphan" name="orphan">
        </body></html>"#;

    fn document() -> Arc<Document> {
        let url = Url::parse("http://localhost:3000/forms/index").unwrap();
        Arc::new(Document::new(url, PAGE, ReadyState::Complete))
    }

    fn sel(id: &str) -> String {
        format!("[data-test-id=\"{id}\"]")
    }

    #[test]
    fn test_resolve_form_has_no_submitter() {
        let doc = document();
        let resolved = ResolvedForm::resolve(&doc, &sel("form1")).unwrap();
        assert_eq!(resolved.form.attr("data-test-id").as_deref(), Some("form1"));
        assert!(resolved.submitter.is_none());
    }

    #[test]
    fn test_resolve_field_uses_owner_without_submitter() {
        let doc = document();
        let resolved = ResolvedForm::resolve(&doc, &sel("input2")).unwrap();
        assert_eq!(resolved.form.attr("data-test-id").as_deref(), Some("form2"));
        assert!(resolved.submitter.is_none());
    }

    #[test]
    fn test_resolve_button_is_submitter() {
        let doc = document();
        let resolved = ResolvedForm::resolve(&doc, &sel("submit2")).unwrap();
        assert_eq!(resolved.form.attr("data-test-id").as_deref(), Some("form2"));
        assert_eq!(
            resolved.submitter.and_then(|s| s.attr("data-test-id")).as_deref(),
            Some("submit2")
        );
    }

    #[test]
    fn test_resolve_rejects_link_and_orphan() {
        let doc = document();

        let err = ResolvedForm::resolve(&doc, "#link1").unwrap_err();
        assert!(matches!(err, Error::NotSubmittable { ref selector } if selector == "#link1"));

        let err = ResolvedForm::resolve(&doc, &sel("orphan")).unwrap_err();
        assert!(matches!(err, Error::NotSubmittable { .. }));
    }

    #[test]
    fn test_resolve_missing_element() {
        let doc = document();
        let err = ResolvedForm::resolve(&doc, "#nope").unwrap_err();
        assert!(matches!(err, Error::ElementNotFound { .. }));
    }

    #[test]
    fn test_action_resolution() {
        let doc = document();

        let form1 = ResolvedForm::resolve(&doc, &sel("form1")).unwrap();
        assert_eq!(form1.action().unwrap().as_str(), "http://localhost:3000/form1Destination");

        let form2 = ResolvedForm::resolve(&doc, &sel("form2")).unwrap();
        assert_eq!(
            form2.action().unwrap().as_str(),
            "http://localhost:3000/forms/form2Destination"
        );

        let own = ResolvedForm::resolve(&doc, &sel("self")).unwrap();
        assert_eq!(own.action().unwrap(), *doc.url());
    }

    #[test]
    fn test_submitter_overrides() {
        let doc = document();
        let alt = ResolvedForm::resolve(&doc, &sel("alt")).unwrap();
        assert_eq!(alt.action().unwrap().as_str(), "http://localhost:3000/elsewhere");
        assert_eq!(alt.encoding(), Encoding::Multipart);

        let plain = ResolvedForm::resolve(&doc, &sel("submit2")).unwrap();
        assert_eq!(plain.encoding(), Encoding::UrlEncoded);
    }

    #[test]
    fn test_submission_urlencoded_with_submitter() {
        let doc = document();
        doc.query(&sel("input2"))
            .unwrap()
            .unwrap()
            .set_value("Input 2 value set from test");

        let submission = ResolvedForm::resolve(&doc, &sel("submit2"))
            .unwrap()
            .submission()
            .unwrap();
        assert_eq!(submission.method, Method::POST);

        let Some(Payload::UrlEncoded(payload)) = submission.payload else {
            panic!("expected urlencoded payload");
        };
        assert_eq!(
            payload.pairs(),
            [
                ("input2", "Input 2 value set from test"),
                ("submit2", "Submit 2")
            ]
        );
    }

    #[test]
    fn test_any_button_type_is_submitter() {
        let doc = document();
        let resolved = ResolvedForm::resolve(&doc, &sel("plain-button")).unwrap();
        assert!(resolved.submitter.is_some());

        let Some(Payload::UrlEncoded(payload)) = resolved.submission().unwrap().payload else {
            panic!("expected urlencoded payload");
        };
        assert_eq!(payload.pairs(), [("a", "1"), ("btn", "clicked")]);
    }

    #[test]
    fn test_submitter_value_is_live() {
        let doc = document();
        doc.query(&sel("plain-submit"))
            .unwrap()
            .unwrap()
            .set_value("changed");

        let submission = ResolvedForm::resolve(&doc, &sel("plain-submit"))
            .unwrap()
            .submission()
            .unwrap();

        let Some(Payload::UrlEncoded(payload)) = submission.payload else {
            panic!("expected urlencoded payload");
        };
        assert_eq!(payload.pairs(), [("a", "1"), ("sub", "changed")]);
    }

    #[test]
    fn test_submission_multipart_with_injected_file() {
        let doc = document();
        let file = FileDescriptor::new(vec![7; 10], "testFile2.jpg", "image/jpg");
        doc.query(&sel("file"))
            .unwrap()
            .unwrap()
            .inject_files(vec![file.clone()]);

        let submission = ResolvedForm::resolve(&doc, &sel("upload"))
            .unwrap()
            .submission()
            .unwrap();

        let Some(Payload::Multipart(payload)) = submission.payload else {
            panic!("expected multipart payload");
        };
        assert_eq!(
            payload.parts(),
            [Part::File {
                name: "file_field".to_string(),
                file
            }]
        );
    }

    #[test]
    fn test_submission_multipart_without_file_has_no_parts() {
        let doc = document();
        let submission = ResolvedForm::resolve(&doc, &sel("file"))
            .unwrap()
            .submission()
            .unwrap();

        let Some(Payload::Multipart(payload)) = submission.payload else {
            panic!("expected multipart payload");
        };
        assert!(payload.parts().is_empty());
    }

    #[test]
    fn test_submission_get_replaces_query() {
        let doc = document();
        let submission = ResolvedForm::resolve(&doc, "[name=go]")
            .unwrap()
            .submission()
            .unwrap();

        assert_eq!(submission.method, Method::GET);
        assert!(submission.payload.is_none());
        assert_eq!(
            submission.url.as_str(),
            "http://localhost:3000/search?q=rust+lang&go=1"
        );
    }
}
