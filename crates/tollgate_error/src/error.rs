//! Top-level error wrapper types.

use crate::{ConfigError, ProviderError, RateLimitError, RetryError};

/// Every failure the Tollgate crates can surface.
///
/// # Examples
///
/// ```
/// use tollgate_error::{RateLimitError, RateLimitErrorKind, TollgateError};
///
/// let err: TollgateError =
///     RateLimitError::new(RateLimitErrorKind::UnconfiguredAction("video".into())).into();
/// assert!(format!("{}", err).contains("Rate Limit Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TollgateErrorKind {
    /// Configuration loading or validation error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Limiter misuse, such as an unconfigured action
    #[from(RateLimitError)]
    RateLimit(RateLimitError),
    /// Downstream call failed after classification and retries
    #[from(RetryError)]
    Retry(RetryError),
    /// Downstream failure surfaced without going through the retry engine
    #[from(ProviderError)]
    Provider(ProviderError),
}

/// Tollgate error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Tollgate Error: {}", _0)]
pub struct TollgateError(Box<TollgateErrorKind>);

impl TollgateError {
    /// Create a new error from a kind.
    pub fn new(kind: TollgateErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TollgateErrorKind {
        &self.0
    }

    /// Unwrap into the error kind.
    pub fn into_kind(self) -> TollgateErrorKind {
        *self.0
    }
}

impl<T> From<T> for TollgateError
where
    T: Into<TollgateErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Tollgate operations.
pub type TollgateResult<T> = std::result::Result<T, TollgateError>;
