//! Driver form submission and file injection.

use tracing::{debug, info};

use crate::document::ElementKind;
use crate::error::{Error, Result};
use crate::form::{FileDescriptor, ResolvedForm};
use crate::transport::OutgoingRequest;

use super::core::Driver;

// ============================================================================
// Driver - Forms
// ============================================================================

impl Driver {
    /// Submits the form selected by `selector`.
    ///
    /// `selector` may select the form itself, any control it owns, or the
    /// button to submit with; a selected button or submit input adds its
    /// name/value after the other fields.
    ///
    /// # Example
    ///
    /// ```ignore
    /// driver.query("[data-test-id=\"input2\"]")?.unwrap().set_value("hello");
    /// driver.submit_form("[data-test-id=\"submit2\"]").await?;
    /// ```
    ///
    /// # Errors
    ///
    /// - [`Error::NoDocument`] if no HTML page is loaded
    /// - [`Error::ElementNotFound`] if nothing matches
    /// - [`Error::NotSubmittable`] if the element has no form
    /// - [`Error::HttpStatus`] for 4xx/5xx responses (after recording them)
    pub async fn submit_form(&mut self, selector: &str) -> Result<()> {
        let document = self.current_document()?;
        let submission = ResolvedForm::resolve(&document, selector)?.submission()?;

        info!(
            session_id = %self.id(),
            selector,
            method = %submission.method,
            url = %submission.url,
            "Submitting form"
        );

        let mut request = OutgoingRequest::new(submission.method, submission.url);
        if let Some(payload) = submission.payload {
            request = request.with_body(payload);
        }

        self.dispatch(request).await?;
        Ok(())
    }

    /// Puts `files` into the file input selected by `selector`.
    ///
    /// Replaces any files set earlier. The files are sent on the next
    /// submission of the input's form.
    ///
    /// # Errors
    ///
    /// - [`Error::NoDocument`] if no HTML page is loaded
    /// - [`Error::ElementNotFound`] if nothing matches
    /// - [`Error::NotAFileInput`] if the element is not `<input type="file">`
    pub fn set_files(&self, selector: &str, files: Vec<FileDescriptor>) -> Result<()> {
        let element = self.require(selector)?;

        if element.kind() != ElementKind::FileInput {
            return Err(Error::not_a_file_input(selector));
        }

        debug!(session_id = %self.id(), selector, count = files.len(), "Setting files");
        element.inject_files(files);
        Ok(())
    }
}
