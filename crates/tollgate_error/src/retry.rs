//! Final dispositions of a retried operation.

use crate::ErrorCategory;

/// Boxed downstream failure, kept so callers can downcast it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// How a retried operation ultimately failed.
///
/// Every variant keeps the original failure as `source`.
#[derive(Debug, derive_more::Display)]
pub enum RetryErrorKind {
    /// Non-retryable classification, raised after the first attempt.
    #[display("Permanent {} failure: {}", category, source)]
    Permanent {
        /// Category assigned by the classifier
        category: ErrorCategory,
        /// Original failure
        source: BoxError,
    },
    /// Retryable classification that outlived the retry budget.
    #[display("Transient {} failure persisted after {} attempts: {}", category, attempts, source)]
    Transient {
        /// Category assigned to the last failure
        category: ErrorCategory,
        /// Total number of invocations, including the first
        attempts: u32,
        /// Last failure observed
        source: BoxError,
    },
    /// The operation reported cancellation. Never retried, never classified.
    #[display("Operation cancelled: {}", source)]
    Cancelled {
        /// Original cancellation signal
        source: BoxError,
    },
    /// The billable submit step of a two-phase operation failed.
    ///
    /// Submission is attempted exactly once regardless of category.
    #[display("Submission failed with {} failure (not retried): {}", category, source)]
    SubmitFailed {
        /// Category assigned by the classifier
        category: ErrorCategory,
        /// Original failure
        source: BoxError,
    },
}

/// Retry error with location tracking.
///
/// # Examples
///
/// ```
/// use tollgate_error::{ErrorCategory, ProviderError, ProviderErrorKind, RetryError};
///
/// let cause = ProviderError::new(
///     "fal",
///     ProviderErrorKind::Http { status_code: 401, message: "Unauthorized".into() },
/// );
/// let err = RetryError::permanent(ErrorCategory::AuthFailure, cause);
/// assert!(err.is_permanent());
/// assert_eq!(err.category(), Some(ErrorCategory::AuthFailure));
/// assert!(!err.user_message().contains("Unauthorized"));
/// ```
#[derive(Debug, derive_more::Display)]
#[display("Retry Error: {} at line {} in {}", kind, line, file)]
pub struct RetryError {
    kind: RetryErrorKind,
    line: u32,
    file: &'static str,
}

impl RetryError {
    /// Create a new retry error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RetryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Wrap a non-retryable failure.
    #[track_caller]
    pub fn permanent(category: ErrorCategory, source: impl Into<BoxError>) -> Self {
        Self::new(RetryErrorKind::Permanent {
            category,
            source: source.into(),
        })
    }

    /// Wrap a retryable failure whose budget is exhausted.
    #[track_caller]
    pub fn transient(category: ErrorCategory, attempts: u32, source: impl Into<BoxError>) -> Self {
        Self::new(RetryErrorKind::Transient {
            category,
            attempts,
            source: source.into(),
        })
    }

    /// Wrap a cancellation signal.
    #[track_caller]
    pub fn cancelled(source: impl Into<BoxError>) -> Self {
        Self::new(RetryErrorKind::Cancelled {
            source: source.into(),
        })
    }

    /// Wrap a failed submission.
    #[track_caller]
    pub fn submit_failed(category: ErrorCategory, source: impl Into<BoxError>) -> Self {
        Self::new(RetryErrorKind::SubmitFailed {
            category,
            source: source.into(),
        })
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RetryErrorKind {
        &self.kind
    }

    /// Category of the failure, if it was classified.
    pub fn category(&self) -> Option<ErrorCategory> {
        match &self.kind {
            RetryErrorKind::Permanent { category, .. }
            | RetryErrorKind::Transient { category, .. }
            | RetryErrorKind::SubmitFailed { category, .. } => Some(*category),
            RetryErrorKind::Cancelled { .. } => None,
        }
    }

    /// Returns true for [`RetryErrorKind::Permanent`].
    pub fn is_permanent(&self) -> bool {
        matches!(self.kind, RetryErrorKind::Permanent { .. })
    }

    /// Returns true for [`RetryErrorKind::Transient`].
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, RetryErrorKind::Transient { .. })
    }

    /// Returns true for [`RetryErrorKind::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, RetryErrorKind::Cancelled { .. })
    }

    /// Number of invocations made before giving up, when known.
    pub fn attempts(&self) -> Option<u32> {
        match &self.kind {
            RetryErrorKind::Transient { attempts, .. } => Some(*attempts),
            RetryErrorKind::Permanent { .. } | RetryErrorKind::SubmitFailed { .. } => Some(1),
            RetryErrorKind::Cancelled { .. } => None,
        }
    }

    /// Borrow the original failure.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match &self.kind {
            RetryErrorKind::Permanent { source, .. }
            | RetryErrorKind::Transient { source, .. }
            | RetryErrorKind::Cancelled { source }
            | RetryErrorKind::SubmitFailed { source, .. } => source.as_ref(),
        }
    }

    /// Take ownership of the original failure.
    pub fn into_cause(self) -> BoxError {
        match self.kind {
            RetryErrorKind::Permanent { source, .. }
            | RetryErrorKind::Transient { source, .. }
            | RetryErrorKind::Cancelled { source }
            | RetryErrorKind::SubmitFailed { source, .. } => source,
        }
    }

    /// Message suitable for end users.
    ///
    /// Never includes the raw downstream message; log [`RetryError::category`]
    /// and the `Display` output for operators instead.
    pub fn user_message(&self) -> &'static str {
        match &self.kind {
            RetryErrorKind::Transient { .. } => {
                "The service is busy right now. Please try again in a few minutes."
            }
            RetryErrorKind::SubmitFailed { category, .. } if category.is_retryable() => {
                "The service is busy right now. Please try again in a few minutes."
            }
            RetryErrorKind::Cancelled { .. } => "The request was cancelled.",
            RetryErrorKind::Permanent { .. } | RetryErrorKind::SubmitFailed { .. } => {
                "Something went wrong while processing your request."
            }
        }
    }
}

impl std::error::Error for RetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause())
    }
}
