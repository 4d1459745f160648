//! Error types for the Tollgate library.
//!
//! This crate provides the foundation error types used throughout the Tollgate workspace,
//! plus the closed failure taxonomy ([`ErrorCategory`]) that drives retry decisions.
//!
//! # Error Hierarchy
//!
//! Errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! The one exception is [`RetryError`], which also carries the original
//! downstream failure as its `source`.
//!
//! # Examples
//!
//! ```
//! use tollgate_error::{RateLimitError, RateLimitErrorKind, TollgateResult};
//!
//! fn lookup(action: &str) -> TollgateResult<()> {
//!     Err(RateLimitError::new(RateLimitErrorKind::UnconfiguredAction(
//!         action.to_string(),
//!     )))?
//! }
//!
//! assert!(lookup("video").is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod category;
mod config;
mod error;
mod provider;
mod rate_limit;
mod retry;

pub use category::ErrorCategory;
pub use config::{ConfigError, ConfigErrorKind};
pub use error::{TollgateError, TollgateErrorKind, TollgateResult};
pub use provider::{ProviderError, ProviderErrorKind};
pub use rate_limit::{RateLimitError, RateLimitErrorKind};
pub use retry::{BoxError, RetryError, RetryErrorKind};
