//! Tollgate: admission control for costly downstream calls.
//!
//! Combines a per-subject sliding-window limiter with a classifying retry
//! engine. Most callers only need a [`Gate`] built from [`TollgateConfig`].
//!
//! # Example
//!
//! ```
//! use std::io;
//! use tollgate::{Admission, Gate, SubjectId, TollgateConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TollgateConfig::from_toml_str(
//!     r#"
//!     [limits.chat]
//!     max_requests = 1
//!     window_seconds = 3600
//!     "#,
//! )?;
//! let gate = Gate::from_config(&config)?;
//! let user = SubjectId::new(7);
//!
//! let first = gate.call(user, "chat", || async { Ok::<_, io::Error>("hello") }).await?;
//! assert!(matches!(first, Admission::Completed("hello")));
//!
//! let second = gate.call(user, "chat", || async { Ok::<_, io::Error>("again") }).await?;
//! assert!(second.is_blocked());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod gate;
pub mod maintenance;
pub mod telemetry;

pub use config::{PruningConfig, RateLimitConfig, RetryPolicyConfig, TollgateConfig};
pub use gate::{Admission, Gate};
pub use telemetry::{LogFormat, LoggingConfig, init_logging};

pub use tollgate_error::{
    ConfigError, ConfigErrorKind, ErrorCategory, ProviderError, ProviderErrorKind,
    RateLimitError, RateLimitErrorKind, RetryError, RetryErrorKind, TollgateError,
    TollgateErrorKind, TollgateResult,
};
pub use tollgate_rate_limit::{
    CheckResult, CounterStore, InMemoryCounterStore, RateLimit, SlidingWindowLimiter, SubjectId,
};
pub use tollgate_retry::{
    Backoff, RetryPolicy, classify, classify_message, is_cancellation, is_retryable, run,
    run_poll, submit_then_poll,
};
