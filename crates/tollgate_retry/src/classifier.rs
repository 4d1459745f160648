//! Best-effort failure classification.
//!
//! Structured signals win: known error types anywhere in the source chain are
//! mapped directly. Only when none is found does the classifier fall back to
//! keyword matching on messages, since downstream clients disagree on error
//! types but mostly agree on wording.

use std::error::Error;
use std::io;
use tollgate_error::{ErrorCategory, ProviderError, ProviderErrorKind, RetryError};

/// Assign a category to `err`.
///
/// Cancellation is not part of the taxonomy; check [`is_cancellation`] first.
///
/// # Examples
///
/// ```
/// use std::io;
/// use tollgate_retry::{classify, ErrorCategory};
///
/// let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
/// assert_eq!(classify(&refused), ErrorCategory::Network);
///
/// let opaque = io::Error::other("HTTP 429: Too Many Requests");
/// assert_eq!(classify(&opaque), ErrorCategory::RateLimit);
/// ```
pub fn classify(err: &(dyn Error + 'static)) -> ErrorCategory {
    if let Some(category) = chain(err).find_map(structural) {
        return category;
    }
    chain(err)
        .filter_map(message)
        .map(|text| classify_message(&text))
        .find(|category| *category != ErrorCategory::Unknown)
        .unwrap_or(ErrorCategory::Unknown)
}

/// Returns true if `category` is worth retrying.
pub fn is_retryable(category: ErrorCategory) -> bool {
    category.is_retryable()
}

/// Returns true if `err` or any of its sources signals cancellation.
pub fn is_cancellation(err: &(dyn Error + 'static)) -> bool {
    chain(err).any(|e| {
        if let Some(provider) = e.downcast_ref::<ProviderError>() {
            return provider.kind().is_cancellation();
        }
        if let Some(join) = e.downcast_ref::<tokio::task::JoinError>() {
            return join.is_cancelled();
        }
        false
    })
}

/// Keyword rules over a free-text failure message.
///
/// Matching is case-insensitive and the first rule to match wins.
///
/// # Examples
///
/// ```
/// use tollgate_retry::{classify_message, ErrorCategory};
///
/// assert_eq!(classify_message("401 Unauthorized"), ErrorCategory::AuthFailure);
/// assert_eq!(classify_message("missing FAL_KEY env var"), ErrorCategory::Configuration);
/// assert_eq!(classify_message("something odd"), ErrorCategory::Unknown);
/// ```
pub fn classify_message(message: &str) -> ErrorCategory {
    let text = message.to_lowercase();
    let has = |needle: &str| text.contains(needle);
    let any = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if any(&["connection", "network"]) {
        ErrorCategory::Network
    } else if (has("rate") && has("limit")) || any(&["429", "too many requests"]) {
        ErrorCategory::RateLimit
    } else if any(&["529", "overloaded"]) {
        ErrorCategory::Overloaded
    } else if any(&["503", "service unavailable", "502", "bad gateway"]) {
        ErrorCategory::ServiceUnavailable
    } else if any(&[
        "401",
        "unauthorized",
        "403",
        "forbidden",
        "api key",
        "authentication",
    ]) {
        ErrorCategory::AuthFailure
    } else if any(&["404", "not found"]) {
        ErrorCategory::NotFound
    } else if any(&["400", "bad request", "invalid", "validation"]) {
        ErrorCategory::InvalidInput
    } else if any(&["configuration", "not configured"])
        || (has("missing") && any(&["key", "env"]))
    {
        ErrorCategory::Configuration
    } else {
        ErrorCategory::Unknown
    }
}

fn chain<'a>(err: &'a (dyn Error + 'static)) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(err), |e| (*e).source())
}

fn structural(err: &(dyn Error + 'static)) -> Option<ErrorCategory> {
    if err.is::<tokio::time::error::Elapsed>() {
        return Some(ErrorCategory::Timeout);
    }
    if let Some(io) = err.downcast_ref::<io::Error>() {
        return match io.kind() {
            io::ErrorKind::TimedOut => Some(ErrorCategory::Timeout),
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe => Some(ErrorCategory::Network),
            _ => None,
        };
    }
    if let Some(http) = err.downcast_ref::<reqwest::Error>() {
        if http.is_timeout() {
            return Some(ErrorCategory::Timeout);
        }
        if http.is_connect() {
            return Some(ErrorCategory::Network);
        }
        return http
            .status()
            .and_then(|status| ErrorCategory::from_status(status.as_u16()));
    }
    if let Some(provider) = err.downcast_ref::<ProviderError>() {
        return match provider.kind() {
            ProviderErrorKind::Http { status_code, .. } => ErrorCategory::from_status(*status_code),
            ProviderErrorKind::Timeout(_) => Some(ErrorCategory::Timeout),
            ProviderErrorKind::Connection(_) => Some(ErrorCategory::Network),
            ProviderErrorKind::Configuration(_) => Some(ErrorCategory::Configuration),
            ProviderErrorKind::Cancelled | ProviderErrorKind::Api(_) => None,
        };
    }
    None
}

// Location-tracked wrappers render source paths, which must not feed the keyword rules.
fn message(err: &(dyn Error + 'static)) -> Option<String> {
    if let Some(provider) = err.downcast_ref::<ProviderError>() {
        return Some(provider.kind().to_string());
    }
    if err.is::<RetryError>() {
        return None;
    }
    Some(err.to_string())
}
