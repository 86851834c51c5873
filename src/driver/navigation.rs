//! Driver navigation methods.

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::document::ElementKind;
use crate::error::{Error, Result};
use crate::transport::{OutgoingRequest, RequestBody};

use super::core::Driver;

// ============================================================================
// Constants
// ============================================================================

/// Default reachability timeout for [`Driver::is_up`].
const DEFAULT_UP_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Driver - Navigation
// ============================================================================

impl Driver {
    /// Navigates to a URL or a path under the prefix.
    ///
    /// An HTML response becomes the current document, whatever its status.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if `url` cannot be resolved
    /// - [`Error::HttpStatus`] for 4xx/5xx responses (after recording them)
    /// - [`Error::Http`] on transport failure
    pub async fn goto(&mut self, url: &str) -> Result<()> {
        let url = self.session.resolve(url)?;
        info!(session_id = %self.id(), url = %url, "Navigating");

        self.dispatch(OutgoingRequest::get(url)).await?;
        Ok(())
    }

    /// Calls a JSON endpoint and decodes the response.
    ///
    /// Without a body this is a GET and `method` is ignored. With a body
    /// the method defaults to POST and must be POST or PUT.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let reply: serde_json::Value = driver.json("/json1", Some(json!({"x": 1})), None).await?;
    /// ```
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidMethod`] before anything is sent, for methods
    ///   other than POST or PUT with a body
    /// - [`Error::HttpStatus`] for 4xx/5xx responses
    /// - [`Error::Json`] if the response is not valid JSON for `T`
    pub async fn json<T: DeserializeOwned>(
        &mut self,
        url: &str,
        body: Option<Value>,
        method: Option<Method>,
    ) -> Result<T> {
        let (method, body) = match body {
            None => (Method::GET, RequestBody::Empty),
            Some(body) => {
                let method = method.unwrap_or(Method::POST);
                if method != Method::POST && method != Method::PUT {
                    return Err(Error::invalid_method(method.as_str()));
                }
                (method, RequestBody::Json(body))
            }
        };

        let url = self.session.resolve(url)?;
        debug!(session_id = %self.id(), method = %method, url = %url, "Calling JSON endpoint");

        let request = OutgoingRequest::new(method, url)
            .with_header("accept", "application/json")
            .with_body(body);
        let response = self.dispatch(request).await?;
        response.json()
    }

    /// Checks that a server answers, without touching navigation state.
    ///
    /// # Arguments
    ///
    /// * `url` - URL or path under the prefix
    /// * `timeout` - Defaults to 5 seconds
    ///
    /// # Errors
    ///
    /// Returns the transport or status error when the server is not up;
    /// this never resolves to `Ok(false)`.
    pub async fn is_up(&self, url: &str, timeout: Option<Duration>) -> Result<bool> {
        let timeout = timeout.unwrap_or(DEFAULT_UP_TIMEOUT);
        debug!(session_id = %self.id(), url = %url, timeout_ms = timeout.as_millis() as u64, "Checking server");

        self.session.check_up(url, timeout).await
    }

    /// Follows the link selected by `selector`.
    ///
    /// # Errors
    ///
    /// - [`Error::NoDocument`] if no HTML page is loaded
    /// - [`Error::ElementNotFound`] if nothing matches
    /// - [`Error::NotALink`] if the element is not a link
    /// - [`Error::MissingHref`] if the link has no usable `href`
    /// - Any error from [`goto`](Self::goto)
    pub async fn follow_link(&mut self, selector: &str) -> Result<()> {
        let element = self.require(selector)?;

        if element.kind() != ElementKind::Link {
            return Err(Error::not_a_link(selector));
        }

        let href = element.href().ok_or_else(|| Error::missing_href(selector))?;
        debug!(session_id = %self.id(), selector, href = %href, "Following link");

        self.goto(href.as_str()).await
    }
}
