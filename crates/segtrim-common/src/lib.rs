//! Segtrim-Common: Shared types and utilities.
//!
//! - **Typed IDs**: [`JobId`] wraps a UUID so job identifiers cannot be mixed
//!   up with other strings in logs and API payloads
//! - **Path Utilities**: upload extension checks and file name sanitizing
//! - **Error Handling**: the service-level error type and its HTTP status mapping
//!
//! # Examples
//!
//! ```
//! use segtrim_common::{Error, JobId, Result};
//! use segtrim_common::paths::is_allowed_video;
//! use std::path::Path;
//!
//! let id = JobId::new();
//! assert!(!id.to_string().is_empty());
//!
//! assert!(is_allowed_video(Path::new("holiday.MOV"), &["mp4", "mov"]));
//!
//! fn example() -> Result<()> {
//!     Err(Error::validation("segment length must be positive"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod ids;
pub mod paths;

pub use error::{Error, Result};
pub use ids::JobId;
