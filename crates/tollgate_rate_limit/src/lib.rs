//! Sliding-window admission control.
//!
//! This crate answers one question for every costly downstream call: is this
//! subject allowed to perform this action right now? Usage is kept as raw
//! timestamps in a pluggable [`CounterStore`] and the window is evaluated
//! lazily at check time.
//!
//! ## Usage
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use tollgate_rate_limit::{InMemoryCounterStore, RateLimit, SlidingWindowLimiter, SubjectId};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let limits = HashMap::from([("chat".to_string(), RateLimit::new(2, 3600)?)]);
//! let limiter = SlidingWindowLimiter::new(Arc::new(InMemoryCounterStore::new()), limits);
//!
//! let user = SubjectId::new(1);
//! let result = limiter.check(user, "chat").await?;
//! if result.is_allowed() {
//!     // call the provider, then:
//!     limiter.record(user, "chat").await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! `check` and `record` are separate steps, so concurrent callers can both be
//! admitted before either records. [`SlidingWindowLimiter::try_acquire`] fuses
//! the two when strict enforcement matters more than refunding failed calls.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod limit;
mod limiter;
mod memory;
mod store;

pub use limit::{CheckResult, RateLimit, SubjectId};
pub use limiter::SlidingWindowLimiter;
pub use memory::InMemoryCounterStore;
pub use store::CounterStore;
pub use tollgate_error::{RateLimitError, RateLimitErrorKind};

/// Result type for limiter operations.
pub type RateLimitResult<T> = Result<T, RateLimitError>;
