//! Failure classification and retry orchestration.
//!
//! Downstream failures are sorted into a closed [`ErrorCategory`] taxonomy.
//! Transient categories are retried with capped exponential backoff;
//! everything else fails fast with a [`RetryError`] that keeps the original
//! failure.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tollgate_error::{ProviderError, ProviderErrorKind};
//! use tollgate_retry::{run, RetryPolicy};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let policy = RetryPolicy::default().with_base_delay(Duration::from_millis(1));
//!
//! let err = run(&policy, || async {
//!     Err::<(), _>(ProviderError::new(
//!         "fal",
//!         ProviderErrorKind::Http { status_code: 404, message: "Not Found".into() },
//!     ))
//! })
//! .await
//! .unwrap_err();
//!
//! assert!(err.is_permanent());
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classifier;
mod orchestrator;
mod policy;

pub use classifier::{classify, classify_message, is_cancellation, is_retryable};
pub use orchestrator::{run, run_poll, submit_then_poll};
pub use policy::{Backoff, RetryPolicy};

pub use tollgate_error::{BoxError, ErrorCategory, RetryError, RetryErrorKind};

/// Result type for retried operations.
pub type RetryResult<T> = Result<T, RetryError>;
