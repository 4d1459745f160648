//! Failure taxonomy for downstream provider calls.

/// Classification of a downstream failure.
///
/// The set is closed. The first five members are transient and safe to retry;
/// the rest are permanent and fail fast.
///
/// # Examples
///
/// ```
/// use tollgate_error::ErrorCategory;
///
/// assert!(ErrorCategory::RateLimit.is_retryable());
/// assert!(!ErrorCategory::AuthFailure.is_retryable());
/// assert_eq!(ErrorCategory::ServiceUnavailable.to_string(), "SERVICE_UNAVAILABLE");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Provider-side rate limiting (429)
    RateLimit,
    /// Request or operation timed out
    Timeout,
    /// Connectivity problem between us and the provider
    Network,
    /// Temporary outage (502, 503)
    ServiceUnavailable,
    /// Provider overloaded (529)
    Overloaded,
    /// Request rejected as malformed (400)
    InvalidInput,
    /// Credentials missing, invalid, or lacking permission (401, 403)
    AuthFailure,
    /// Resource does not exist (404)
    NotFound,
    /// Local setup problem, e.g. a missing API key
    Configuration,
    /// Nothing matched
    Unknown,
}

impl ErrorCategory {
    /// Categories that are safe to retry.
    pub const RETRYABLE: [ErrorCategory; 5] = [
        ErrorCategory::RateLimit,
        ErrorCategory::Timeout,
        ErrorCategory::Network,
        ErrorCategory::ServiceUnavailable,
        ErrorCategory::Overloaded,
    ];

    /// Returns true if failures in this category are transient.
    pub fn is_retryable(self) -> bool {
        Self::RETRYABLE.contains(&self)
    }

    /// Map an HTTP status code onto the taxonomy.
    ///
    /// Returns `None` for codes that carry no reliable signal (e.g. 500), so
    /// callers can fall back to inspecting the message.
    ///
    /// # Examples
    ///
    /// ```
    /// use tollgate_error::ErrorCategory;
    ///
    /// assert_eq!(ErrorCategory::from_status(429), Some(ErrorCategory::RateLimit));
    /// assert_eq!(ErrorCategory::from_status(529), Some(ErrorCategory::Overloaded));
    /// assert_eq!(ErrorCategory::from_status(500), None);
    /// ```
    pub fn from_status(status_code: u16) -> Option<Self> {
        match status_code {
            429 => Some(ErrorCategory::RateLimit),
            529 => Some(ErrorCategory::Overloaded),
            502 | 503 => Some(ErrorCategory::ServiceUnavailable),
            408 | 504 => Some(ErrorCategory::Timeout),
            401 | 403 => Some(ErrorCategory::AuthFailure),
            404 => Some(ErrorCategory::NotFound),
            400 | 422 => Some(ErrorCategory::InvalidInput),
            _ => None,
        }
    }
}
