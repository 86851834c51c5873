//! Transport-level retry policy.
//!
//! Only idempotent methods are retried, and only for a fixed set of
//! overload/gateway statuses or connection failures. Form submissions
//! (POST) are never retried.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use reqwest::Method;

// ============================================================================
// Constants
// ============================================================================

/// Statuses retried by default.
pub const RETRY_STATUS_CODES: [u16; 8] = [408, 429, 502, 503, 504, 521, 522, 524];

/// Default number of retries after the first attempt.
const DEFAULT_LIMIT: u32 = 2;

/// Delay before the first retry; doubles per attempt.
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on any single delay, including `Retry-After`.
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

// ============================================================================
// RetryPolicy
// ============================================================================

/// When and how long to wait before retrying a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum retries after the first attempt.
    pub limit: u32,
    /// Response statuses that trigger a retry.
    pub status_codes: Vec<u16>,
    /// Methods that may be retried.
    pub methods: Vec<Method>,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap on a single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            status_codes: RETRY_STATUS_CODES.to_vec(),
            methods: vec![
                Method::GET,
                Method::PUT,
                Method::HEAD,
                Method::DELETE,
                Method::OPTIONS,
                Method::TRACE,
            ],
            base_delay: DEFAULT_BASE_DELAY,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl RetryPolicy {
    /// Creates a policy that never retries.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self {
            limit: 0,
            ..Self::default()
        }
    }

    /// Sets the retry limit.
    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the delay before the first retry.
    #[inline]
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the cap on a single delay.
    #[inline]
    #[must_use]
    pub fn with_max_backoff(mut self, max: Duration) -> Self {
        self.max_backoff = max;
        self
    }
}

// ============================================================================
// Decisions
// ============================================================================

impl RetryPolicy {
    /// Returns `true` if `method` may be retried.
    #[inline]
    #[must_use]
    pub fn allows_method(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Returns `true` if `status` triggers a retry.
    #[inline]
    #[must_use]
    pub fn retries_status(&self, status: u16) -> bool {
        self.status_codes.contains(&status)
    }

    /// Returns the delay before retry number `attempt` (0-based).
    ///
    /// A server-supplied `Retry-After` replaces the exponential delay.
    /// Both are capped at `max_backoff`.
    #[must_use]
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let delay = retry_after.unwrap_or_else(|| {
            self.base_delay
                .saturating_mul(2u32.saturating_pow(attempt))
        });
        delay.min(self.max_backoff)
    }
}

/// Parses a `Retry-After` header given in seconds.
///
/// HTTP-date values are not supported and yield `None`.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

// ============================================================================
// Tests
// ============================================================================
