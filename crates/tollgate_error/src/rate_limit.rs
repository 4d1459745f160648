//! Error types for rate limiting operations.

/// Error kinds for rate limiting operations.
///
/// A blocked request is not an error; it is an ordinary `CheckResult` with
/// `allowed == false`. These kinds cover programmer and configuration mistakes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum RateLimitErrorKind {
    /// The action name has no configured limit.
    #[display("No rate limit configured for action: {}", _0)]
    UnconfiguredAction(String),
    /// A limit was constructed with out-of-range values.
    #[display("Invalid rate limit: {}", _0)]
    InvalidLimit(String),
}

/// Rate limiting error with location tracking.
///
/// # Examples
///
/// ```
/// use tollgate_error::{RateLimitError, RateLimitErrorKind};
///
/// let err = RateLimitError::new(RateLimitErrorKind::UnconfiguredAction("video".into()));
/// assert!(matches!(err.kind(), RateLimitErrorKind::UnconfiguredAction(a) if a == "video"));
/// ```
#[derive(Debug, Clone, derive_more::Display)]
#[display("Rate Limit Error: {} at line {} in {}", kind, line, file)]
pub struct RateLimitError {
    kind: RateLimitErrorKind,
    line: u32,
    file: &'static str,
}

impl RateLimitError {
    /// Create a new rate limiting error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RateLimitErrorKind {
        &self.kind
    }
}

impl std::error::Error for RateLimitError {}

impl From<RateLimitErrorKind> for RateLimitError {
    #[track_caller]
    fn from(kind: RateLimitErrorKind) -> Self {
        Self::new(kind)
    }
}
