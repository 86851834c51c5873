//! Type-safe identifiers.
//!
//! Newtype wrappers keep identifiers from being mixed with arbitrary
//! strings in log fields and debug output.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// SessionId
// ============================================================================

/// Identifies one driver session (one cookie jar, one navigation state).
///
/// Generated once per [`Driver`](crate::Driver) and attached to every
/// tracing event the session emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a new random session ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable.
        let full = self.0.simple().to_string();
        f.write_str(&full[..8])
    }
}

// ============================================================================
// Tests
// ============================================================================
