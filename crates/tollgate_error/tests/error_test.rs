use std::error::Error;
use tollgate_error::{
    ConfigError, ConfigErrorKind, ErrorCategory, ProviderError, ProviderErrorKind,
    RateLimitError, RateLimitErrorKind, RetryError, RetryErrorKind, TollgateError,
    TollgateErrorKind,
};

fn overloaded() -> ProviderError {
    ProviderError::new(
        "anthropic",
        ProviderErrorKind::Http {
            status_code: 529,
            message: "Overloaded".to_string(),
        },
    )
}

#[test]
fn test_provider_error_tracks_location() {
    let err = overloaded();
    let msg = err.to_string();
    assert!(msg.contains("anthropic"));
    assert!(msg.contains("error_test.rs"));
}

#[test]
fn test_transient_retry_error_reports_attempts() {
    let err = RetryError::transient(ErrorCategory::Overloaded, 4, overloaded());

    assert!(err.is_transient());
    assert_eq!(err.attempts(), Some(4));
    assert_eq!(err.category(), Some(ErrorCategory::Overloaded));
    assert!(err.to_string().contains("after 4 attempts"));
}

#[test]
fn test_retry_error_keeps_original_failure() {
    let err = RetryError::permanent(ErrorCategory::NotFound, overloaded());

    let source = err.source().expect("source is always present");
    assert!(source.downcast_ref::<ProviderError>().is_some());

    let cause = err.into_cause();
    let provider = cause.downcast::<ProviderError>().unwrap();
    assert_eq!(provider.provider(), "anthropic");
}

#[test]
fn test_cancelled_has_no_category() {
    let err = RetryError::cancelled(ProviderError::new("fal", ProviderErrorKind::Cancelled));

    assert!(err.is_cancelled());
    assert_eq!(err.category(), None);
    assert_eq!(err.attempts(), None);
    assert_eq!(err.user_message(), "The request was cancelled.");
}

#[test]
fn test_user_message_hides_raw_provider_text() {
    let secret = ProviderError::new(
        "fal",
        ProviderErrorKind::Api("invalid api key sk-1234".to_string()),
    );
    let permanent = RetryError::permanent(ErrorCategory::AuthFailure, secret);
    assert!(!permanent.user_message().contains("sk-1234"));
    assert_eq!(
        permanent.user_message(),
        "Something went wrong while processing your request."
    );

    let transient = RetryError::transient(ErrorCategory::RateLimit, 4, overloaded());
    assert!(transient.user_message().contains("busy"));
}

#[test]
fn test_submit_failed_message_depends_on_category() {
    let busy = RetryError::submit_failed(ErrorCategory::ServiceUnavailable, overloaded());
    assert!(busy.user_message().contains("busy"));

    let broken = RetryError::submit_failed(ErrorCategory::InvalidInput, overloaded());
    assert!(!broken.user_message().contains("busy"));
    assert!(matches!(broken.kind(), RetryErrorKind::SubmitFailed { .. }));
}

#[test]
fn test_tollgate_error_wraps_every_kind() {
    let err: TollgateError = ConfigError::invalid("limits.chat.max_requests", "must be > 0").into();
    assert!(matches!(err.kind(), TollgateErrorKind::Config(_)));

    let err: TollgateError =
        RateLimitError::new(RateLimitErrorKind::UnconfiguredAction("video".into())).into();
    assert!(matches!(err.kind(), TollgateErrorKind::RateLimit(_)));

    let err: TollgateError = RetryError::cancelled(overloaded()).into();
    assert!(matches!(err.into_kind(), TollgateErrorKind::Retry(_)));

    let err: TollgateError = overloaded().into();
    assert!(err.to_string().starts_with("Tollgate Error"));
}

#[test]
fn test_config_error_kinds_display() {
    let err = ConfigError::new(ConfigErrorKind::Load("missing file".into()));
    assert!(err.to_string().contains("Failed to load configuration: missing file"));
}
