//! HTTP session: one cookie jar, one prefix, one retry policy.
//!
//! Every request a driver makes goes through its [`Session`]. The session
//! resolves relative targets against the prefix, retries idempotent
//! requests on overload statuses, and keeps cookies across calls.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::RETRY_AFTER;
use reqwest::redirect::Policy;
use reqwest::{Client, Method};
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::driver::DriverOptions;
use crate::error::{Error, Result};
use crate::identifiers::SessionId;

use super::request::{OutgoingRequest, RawResponse};
use super::retry::{RetryPolicy, parse_retry_after};

// ============================================================================
// Session
// ============================================================================

/// Transport state owned by one driver.
///
/// Two sessions never share cookies.
pub struct Session {
    /// Session identifier for log fields.
    id: SessionId,
    /// HTTP client bound to `jar`.
    client: Client,
    /// Cookie jar.
    jar: Arc<Jar>,
    /// Base URL for relative targets.
    prefix: Option<Url>,
    /// Retry policy.
    retry: RetryPolicy,
    /// Default request timeout.
    timeout: Option<Duration>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("prefix", &self.prefix.as_ref().map(Url::as_str))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Constructor
// ============================================================================

impl Session {
    /// Creates a session with an empty cookie jar.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(id: SessionId, options: &DriverOptions) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .redirect(Policy::limited(options.max_redirects))
            .user_agent(options.user_agent())
            .build()?;

        debug!(
            session_id = %id,
            prefix = ?options.prefix_url.as_ref().map(Url::as_str),
            "Session created"
        );

        Ok(Self {
            id,
            client,
            jar,
            prefix: options.prefix_url.clone(),
            retry: options.retry.clone(),
            timeout: options.timeout,
        })
    }
}

// ============================================================================
// Session - Accessors
// ============================================================================

impl Session {
    /// Returns the session ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the prefix URL.
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> Option<&Url> {
        self.prefix.as_ref()
    }
}

// ============================================================================
// Session - URL Resolution
// ============================================================================

impl Session {
    /// Turns a navigation target into an absolute URL.
    ///
    /// Absolute URLs pass through. Anything else is appended to the
    /// prefix, dropping a leading copy of the prefix path if the target
    /// already carries one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for a relative target without a
    /// prefix, or one that cannot be joined.
    pub fn resolve(&self, target: &str) -> Result<Url> {
        let target = target.trim();

        if let Ok(url) = Url::parse(target) {
            return Ok(url);
        }

        let Some(prefix) = &self.prefix else {
            return Err(Error::invalid_url(
                target,
                "relative URL requires a prefix_url",
            ));
        };

        join_prefix(prefix, target)
    }
}

/// Appends `target` to `prefix`, removing a duplicated prefix path.
pub(crate) fn join_prefix(prefix: &Url, target: &str) -> Result<Url> {
    if target.is_empty() {
        return Ok(prefix.clone());
    }

    let split = target.find(['?', '#']).unwrap_or(target.len());
    let (path, suffix) = target.split_at(split);
    let path = path.trim_start_matches('/');

    let prefix_path = prefix.path().trim_matches('/');
    let path = if prefix_path.is_empty() {
        path
    } else if path == prefix_path {
        ""
    } else {
        path.strip_prefix(prefix_path)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(path)
    };

    let mut base = prefix.clone();
    base.set_query(None);
    base.set_fragment(None);
    if prefix_path.is_empty() {
        base.set_path("/");
    } else {
        base.set_path(&format!("/{prefix_path}/"));
    }

    base.join(&format!("{path}{suffix}"))
        .map_err(|e| Error::invalid_url(target, e.to_string()))
}

// ============================================================================
// Session - Requests
// ============================================================================

impl Session {
    /// Sends a request, retrying as the policy allows.
    ///
    /// Error statuses are returned as responses; callers decide what a 4xx
    /// or 5xx means. Only transport failures are errors here.
    ///
    /// # Errors
    ///
    /// - [`Error::Http`] on connection failures or timeouts once retries
    ///   are exhausted
    /// - [`Error::Http`] if a multipart body cannot be built
    pub async fn request(&self, request: &OutgoingRequest) -> Result<RawResponse> {
        let retryable_method = self.retry.allows_method(&request.method);
        let mut attempt: u32 = 0;

        loop {
            let builder = request.build(&self.client, self.timeout)?;
            let can_retry = retryable_method && attempt < self.retry.limit;

            debug!(
                session_id = %self.id,
                method = %request.method,
                url = %request.url,
                attempt,
                "Sending request"
            );

            match builder.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if can_retry && self.retry.retries_status(status) {
                        let retry_after = response
                            .headers()
                            .get(RETRY_AFTER)
                            .and_then(|value| value.to_str().ok())
                            .and_then(parse_retry_after);
                        let delay = self.retry.delay(attempt, retry_after);

                        warn!(
                            session_id = %self.id,
                            status,
                            url = %request.url,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying request"
                        );

                        sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    let raw = RawResponse::read(response).await?;
                    debug!(
                        session_id = %self.id,
                        status,
                        url = %raw.url,
                        bytes = raw.body.len(),
                        "Received response"
                    );
                    return Ok(raw);
                }
                Err(e) if can_retry && (e.is_connect() || e.is_timeout()) => {
                    let delay = self.retry.delay(attempt, None);
                    warn!(
                        session_id = %self.id,
                        url = %request.url,
                        attempt,
                        error = %e,
                        "Retrying after transport failure"
                    );

                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Checks that `target` answers within `timeout`.
    ///
    /// Does not touch navigation state.
    ///
    /// # Errors
    ///
    /// - [`Error::HttpStatus`] if the server answers with an error status
    /// - [`Error::Http`] if it cannot be reached in time
    pub async fn check_up(&self, target: &str, timeout: Duration) -> Result<bool> {
        let url = self.resolve(target)?;
        let response = self
            .request(&OutgoingRequest::new(Method::GET, url).with_timeout(timeout))
            .await?;

        if response.is_error() {
            return Err(Error::http_status(
                response.status.as_u16(),
                response.url.as_str(),
            ));
        }

        Ok(true)
    }
}

// ============================================================================
// Session - Cookies
// ============================================================================

impl Session {
    /// Returns the `Cookie` header the jar would send to `url`.
    #[must_use]
    pub fn cookies(&self, url: &Url) -> Option<String> {
        self.jar
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Stores a `Set-Cookie` style string as if `url` had sent it.
    pub fn add_cookie(&self, cookie: &str, url: &Url) {
        debug!(session_id = %self.id, url = %url, "Adding cookie");
        self.jar.add_cookie_str(cookie, url);
    }
}

// ============================================================================
// Tests
// ============================================================================
