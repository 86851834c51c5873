//! Driver session core.
//!
//! The [`Driver`] owns one transport session, one response pipeline and
//! the navigation state they produce. Public operations live in the
//! sibling modules (`navigation`, `elements`, `forms`, `download`,
//! `storage`); all of them funnel requests through [`Driver::dispatch`].
//!
//! # Example
//!
//! ```ignore
//! use formsurf::{Driver, Result};
//!
//! # async fn example() -> Result<()> {
//! let mut driver = Driver::builder()
//!     .prefix_url("http://localhost:3000")
//!     .build()?;
//!
//! driver.goto("/").await?;
//! println!("Now at {:?}", driver.current_url());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::document::{DocumentEngine, DocumentOptions};
use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::pipeline::{PageResponse, ResponsePipeline, SessionState};
use crate::transport::{OutgoingRequest, Session};

use super::builder::DriverBuilder;
use super::options::DriverOptions;

// ============================================================================
// Driver
// ============================================================================

/// A headless browser session for integration tests.
///
/// Each driver has its own cookie jar and navigation state; two drivers
/// never share either. Navigation takes `&mut self`, so a driver runs
/// one navigation at a time.
pub struct Driver {
    /// Cookie jar, prefix and retry loop.
    pub(crate) session: Session,
    /// Document building and state recording.
    pub(crate) pipeline: ResponsePipeline,
    /// Current URL, document and last response.
    pub(crate) state: SessionState,
}

// ============================================================================
// Driver - Display
// ============================================================================

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("session", &self.session)
            .field("current_url", &self.current_url().map(Url::as_str))
            .field("has_document", &self.state.document().is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Driver - Constructors
// ============================================================================

impl Driver {
    /// Creates a configuration builder for the driver.
    #[inline]
    #[must_use]
    pub fn builder() -> DriverBuilder {
        DriverBuilder::new()
    }

    /// Creates a driver with default options and no prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        DriverBuilder::new().build()
    }

    /// Creates a driver from validated options.
    pub(crate) fn from_parts(
        options: &DriverOptions,
        engine: Arc<dyn DocumentEngine>,
    ) -> Result<Self> {
        let session = Session::new(SessionId::generate(), options)?;
        let pipeline = ResponsePipeline::new(
            engine,
            DocumentOptions {
                allow_scripts: options.run_scripts,
            },
            options.ready_timeout,
        );

        info!(
            session_id = %session.id(),
            run_scripts = options.run_scripts,
            "Driver created"
        );

        Ok(Self {
            session,
            pipeline,
            state: SessionState::default(),
        })
    }
}

// ============================================================================
// Driver - Accessors
// ============================================================================

impl Driver {
    /// Returns the session ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.session.id()
    }

    /// Returns the URL of the last response, after redirects.
    ///
    /// `None` before the first navigation.
    #[inline]
    #[must_use]
    pub fn current_url(&self) -> Option<&Url> {
        self.state.current_url()
    }

    /// Returns the last response, HTML or not.
    #[inline]
    #[must_use]
    pub fn last_response(&self) -> Option<&Arc<PageResponse>> {
        self.state.last_response()
    }
}

// ============================================================================
// Driver - Internal
// ============================================================================

impl Driver {
    /// Sends a request, runs the response pipeline, then checks the status.
    ///
    /// The response is recorded before an error status is reported, so an
    /// HTML error page stays queryable after the error.
    pub(crate) async fn dispatch(&mut self, request: OutgoingRequest) -> Result<Arc<PageResponse>> {
        let raw = self.session.request(&request).await?;
        let response = self.pipeline.process(raw, &mut self.state).await?;

        if response.raw().is_error() {
            debug!(
                session_id = %self.session.id(),
                status = response.status().as_u16(),
                url = %response.url(),
                "Error status"
            );
            return Err(Error::http_status(
                response.status().as_u16(),
                response.url().as_str(),
            ));
        }

        Ok(response)
    }
}
