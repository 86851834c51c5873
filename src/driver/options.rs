//! Driver session options.
//!
//! Plain configuration data for one driver session: where relative
//! navigation targets resolve to, how long requests may take, and how
//! the transport retries.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use formsurf::DriverOptions;
//!
//! let options = DriverOptions::new()
//!     .with_prefix_url("http://localhost:3000")?
//!     .with_timeout(Duration::from_secs(10))
//!     .with_run_scripts();
//!
//! options.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::transport::RetryPolicy;

// ============================================================================
// Constants
// ============================================================================

/// Default upper bound on waiting for a loading document.
const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default redirect limit.
const DEFAULT_MAX_REDIRECTS: usize = 10;

// ============================================================================
// DriverOptions
// ============================================================================

/// Configuration for one driver session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOptions {
    /// Base URL for relative navigation targets.
    pub prefix_url: Option<Url>,

    /// Let the document engine run page scripts.
    pub run_scripts: bool,

    /// Default per-request timeout.
    pub timeout: Option<Duration>,

    /// Upper bound on waiting for a loading document to become ready.
    pub ready_timeout: Duration,

    /// Transport retry policy.
    pub retry: RetryPolicy,

    /// `User-Agent` header; `None` uses the crate default.
    pub user_agent: Option<String>,

    /// Maximum redirects followed per request.
    pub max_redirects: usize,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            prefix_url: None,
            run_scripts: false,
            timeout: None,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            retry: RetryPolicy::default(),
            user_agent: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl DriverOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl DriverOptions {
    /// Sets the prefix URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `prefix` is not an absolute URL.
    pub fn with_prefix_url(mut self, prefix: &str) -> Result<Self> {
        let url = Url::parse(prefix).map_err(|e| Error::invalid_url(prefix, e.to_string()))?;
        self.prefix_url = Some(url);
        Ok(self)
    }

    /// Enables script execution in the document engine.
    #[inline]
    #[must_use]
    pub fn with_run_scripts(mut self) -> Self {
        self.run_scripts = true;
        self
    }

    /// Sets the default per-request timeout.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the ready-state wait bound.
    #[inline]
    #[must_use]
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Sets the retry policy.
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the `User-Agent` header.
    #[inline]
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the redirect limit.
    #[inline]
    #[must_use]
    pub fn with_max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl DriverOptions {
    /// Returns the `User-Agent` to send.
    #[must_use]
    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("formsurf/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the prefix is not HTTP(S), a timeout is
    /// zero, or the retry policy cannot back off.
    pub fn validate(&self) -> Result<()> {
        if let Some(prefix) = &self.prefix_url
            && !matches!(prefix.scheme(), "http" | "https")
        {
            return Err(Error::config(format!(
                "prefix_url must be http or https, got '{prefix}'"
            )));
        }

        if self.timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(Error::config("timeout must be greater than zero"));
        }

        if self.ready_timeout.is_zero() {
            return Err(Error::config("ready_timeout must be greater than zero"));
        }

        if self.retry.limit > 0 && self.retry.max_backoff < self.retry.base_delay {
            return Err(Error::config(
                "retry max_backoff must not be shorter than base_delay",
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
