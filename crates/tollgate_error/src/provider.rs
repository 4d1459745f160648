//! Downstream provider errors.
//!
//! Chat and image clients report failures through [`ProviderError`] when they
//! can say something structured about what went wrong. The retry classifier
//! reads the kind directly instead of guessing from the message.

/// Provider-specific error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProviderErrorKind {
    /// HTTP error with status code and message
    #[display("HTTP {} error: {}", status_code, message)]
    Http {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// The provider did not answer in time
    #[display("Request timed out: {}", _0)]
    Timeout(String),
    /// Could not reach the provider
    #[display("Connection failed: {}", _0)]
    Connection(String),
    /// Client is missing credentials or settings
    #[display("Client not configured: {}", _0)]
    Configuration(String),
    /// The request was cancelled before it finished
    #[display("Request cancelled")]
    Cancelled,
    /// Anything else the client reported as free text
    #[display("{}", _0)]
    Api(String),
}

impl ProviderErrorKind {
    /// Returns true if this kind signals cancellation rather than failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ProviderErrorKind::Cancelled)
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use tollgate_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new(
///     "anthropic",
///     ProviderErrorKind::Http {
///         status_code: 529,
///         message: "Overloaded".to_string(),
///     },
/// );
/// assert_eq!(err.provider(), "anthropic");
/// assert!(err.to_string().contains("HTTP 529"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error ({}): {} at line {} in {}", provider, kind, line, file)]
pub struct ProviderError {
    provider: String,
    kind: ProviderErrorKind,
    line: u32,
    file: &'static str,
}

impl ProviderError {
    /// Create a new provider error with automatic location tracking.
    #[track_caller]
    pub fn new(provider: impl Into<String>, kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            provider: provider.into(),
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Name of the provider that failed.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ProviderErrorKind {
        &self.kind
    }
}
