//! Builder pattern for driver configuration.
//!
//! Provides a fluent API for configuring and creating [`Driver`] instances.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use formsurf::Driver;
//!
//! # fn example() -> formsurf::Result<()> {
//! let driver = Driver::builder()
//!     .prefix_url("http://localhost:3000")
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::document::{DocumentEngine, HtmlEngine};
use crate::error::{Error, Result};
use crate::transport::RetryPolicy;

use super::core::Driver;
use super::options::DriverOptions;

// ============================================================================
// DriverBuilder
// ============================================================================

/// Builder for configuring a [`Driver`] instance.
///
/// Use [`Driver::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct DriverBuilder {
    /// Options other than the prefix.
    options: DriverOptions,
    /// Prefix URL as supplied; parsed in `build`.
    prefix_url: Option<String>,
    /// Custom document engine.
    engine: Option<Arc<dyn DocumentEngine>>,
}

impl fmt::Debug for DriverBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverBuilder")
            .field("options", &self.options)
            .field("prefix_url", &self.prefix_url)
            .field("custom_engine", &self.engine.is_some())
            .finish()
    }
}

// ============================================================================
// DriverBuilder Implementation
// ============================================================================

impl DriverBuilder {
    /// Creates a new driver builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the prefix URL for relative navigation targets.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Absolute URL (e.g., "http://localhost:3000")
    #[inline]
    #[must_use]
    pub fn prefix_url(mut self, prefix: impl Into<String>) -> Self {
        self.prefix_url = Some(prefix.into());
        self
    }

    /// Enables or disables page script execution.
    #[inline]
    #[must_use]
    pub fn run_scripts(mut self, enabled: bool) -> Self {
        self.options.run_scripts = enabled;
        self
    }

    /// Sets the default per-request timeout.
    #[inline]
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Sets the upper bound on waiting for a loading document.
    #[inline]
    #[must_use]
    pub fn ready_timeout(mut self, timeout: Duration) -> Self {
        self.options.ready_timeout = timeout;
        self
    }

    /// Sets the transport retry policy.
    #[inline]
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.options.retry = retry;
        self
    }

    /// Sets the `User-Agent` header.
    #[inline]
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the redirect limit.
    #[inline]
    #[must_use]
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.options.max_redirects = max;
        self
    }

    /// Replaces all options at once.
    ///
    /// A prefix set with [`prefix_url`](Self::prefix_url) still wins.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: DriverOptions) -> Self {
        self.options = options;
        self
    }

    /// Uses a custom document engine instead of [`HtmlEngine`].
    #[inline]
    #[must_use]
    pub fn engine(mut self, engine: Arc<dyn DocumentEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Builds the driver with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the prefix URL is not an absolute HTTP(S) URL
    /// - [`Error::Config`] if any option is out of range
    /// - [`Error::Http`] if the HTTP client cannot be built
    pub fn build(self) -> Result<Driver> {
        let options = self.validate_options()?;
        let engine = self.engine.unwrap_or_else(|| Arc::new(HtmlEngine));

        Driver::from_parts(&options, engine)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl DriverBuilder {
    /// Merges the prefix into the options and validates them.
    fn validate_options(&self) -> Result<DriverOptions> {
        let mut options = self.options.clone();

        if let Some(prefix) = &self.prefix_url {
            let url = Url::parse(prefix).map_err(|e| {
                Error::config(format!(
                    "Invalid prefix_url '{prefix}': {e}\n\
                     Example: Driver::builder().prefix_url(\"http://localhost:3000\")"
                ))
            })?;
            options.prefix_url = Some(url);
        }

        options.validate()?;
        Ok(options)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_default_builder() {
        let builder = DriverBuilder::new();
        assert!(builder.prefix_url.is_none());
        assert!(builder.engine.is_none());
        assert_eq!(builder.options, DriverOptions::default());
    }

    #[test]
    fn test_setters() {
        let builder = DriverBuilder::new()
            .prefix_url("http://localhost:3000")
            .run_scripts(true)
            .timeout(Duration::from_secs(3))
            .user_agent("agent")
            .max_redirects(2);

        assert_eq!(builder.prefix_url.as_deref(), Some("http://localhost:3000"));
        assert!(builder.options.run_scripts);
        assert_eq!(builder.options.timeout, Some(Duration::from_secs(3)));
        assert_eq!(builder.options.user_agent.as_deref(), Some("agent"));
        assert_eq!(builder.options.max_redirects, 2);
    }

    #[test]
    fn test_build_without_prefix() {
        let driver = DriverBuilder::new().build().unwrap();
        assert!(driver.current_url().is_none());
    }

    #[test]
    fn test_build_fails_with_relative_prefix() {
        let err = DriverBuilder::new().prefix_url("localhost").build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("prefix_url"));
    }

    #[test]
    fn test_build_fails_with_invalid_options() {
        let err = DriverBuilder::new()
            .ready_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_prefix_wins_over_options() {
        let options = DriverOptions::new()
            .with_prefix_url("http://other:1/")
            .unwrap();
        let merged = DriverBuilder::new()
            .options(options)
            .prefix_url("http://localhost:3000")
            .validate_options()
            .unwrap();

        assert_eq!(
            merged.prefix_url.as_ref().map(Url::as_str),
            Some("http://localhost:3000/")
        );
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = DriverBuilder::new().prefix_url("http://localhost:3000");
        let cloned = builder.clone();
        assert_eq!(builder.prefix_url, cloned.prefix_url);
    }
}
