//! Driver module.
//!
//! This module provides the main entry point for scripted browsing.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Driver`] | One isolated browsing session |
//! | [`DriverBuilder`] | Fluent configuration builder |
//! | [`DriverOptions`] | Prefix, timeouts, retry and engine options |
//! | [`Download`] | Captured attachment response |
//!
//! The [`Driver`] implementation is split by concern:
//!
//! | File | Methods |
//! |------|---------|
//! | `navigation.rs` | `goto`, `json`, `is_up`, `follow_link` |
//! | `elements.rs` | `document`, `query`, `query_all` |
//! | `forms.rs` | `submit_form`, `set_files` |
//! | `download.rs` | `get_download`, `download` |
//! | `storage.rs` | `cookies`, `cookie`, `add_cookie` |
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
//! driver.follow_link("[data-test-id=\"link1\"]").await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for driver configuration.
pub mod builder;

/// Core driver implementation.
pub mod core;

/// Attachment capture.
pub mod download;

/// Driver options.
pub mod options;

mod elements;
mod forms;
mod navigation;
mod storage;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::DriverBuilder;
pub use core::Driver;
pub use download::Download;
pub use options::DriverOptions;
