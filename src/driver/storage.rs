//! Cookie jar methods.

use tracing::debug;

use crate::error::Result;

use super::core::Driver;

// ============================================================================
// Driver - Storage (Cookies)
// ============================================================================

impl Driver {
    /// Returns the `Cookie` header this session would send to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`](crate::Error::InvalidUrl) if `url`
    /// cannot be resolved.
    pub fn cookies(&self, url: &str) -> Result<Option<String>> {
        let url = self.session.resolve(url)?;
        let cookies = self.session.cookies(&url);

        debug!(session_id = %self.id(), url = %url, found = cookies.is_some(), "Got cookies");
        Ok(cookies)
    }

    /// Returns the value of the cookie `name` sent to `url`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`](crate::Error::InvalidUrl) if `url`
    /// cannot be resolved.
    pub fn cookie(&self, url: &str, name: &str) -> Result<Option<String>> {
        Ok(self
            .cookies(url)?
            .as_deref()
            .and_then(|header| cookie_value(header, name)))
    }

    /// Stores a `Set-Cookie` style string as if `url` had sent it.
    ///
    /// # Example
    ///
    /// ```ignore
    /// driver.add_cookie("session=abc123; Path=/", "/")?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`](crate::Error::InvalidUrl) if `url`
    /// cannot be resolved.
    pub fn add_cookie(&self, cookie: &str, url: &str) -> Result<()> {
        let url = self.session.resolve(url)?;
        self.session.add_cookie(cookie, &url);
        Ok(())
    }
}

/// Finds `name` in a `Cookie` header value.
fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

// ============================================================================
// Tests
// ============================================================================
