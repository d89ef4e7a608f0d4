/*!
 * Tests for error types and conversions
 */

use axum::http::StatusCode;
use transcript_gateway::errors::{GatewayError, ProviderError};

#[test]
fn test_provider_error_not_found_should_display_detail() {
    let error = ProviderError::NotFound("video X is unavailable".to_string());
    let display = format!("{}", error);
    assert!(display.contains("No transcript found"));
    assert!(display.contains("video X is unavailable"));
    assert!(error.is_not_found());
}

#[test]
fn test_provider_error_other_kinds_should_not_be_not_found() {
    for error in [
        ProviderError::Disabled("d".to_string()),
        ProviderError::Blocked("b".to_string()),
        ProviderError::NotTranslatable("t".to_string()),
        ProviderError::Unknown("u".to_string()),
    ] {
        assert!(!error.is_not_found());
    }
}

#[test]
fn test_validation_error_should_display_bare_message() {
    let error = GatewayError::Validation("No video IDs provided".to_string());
    assert_eq!(error.to_string(), "No video IDs provided");
}

#[test]
fn test_rate_limit_error_should_display_fixed_message() {
    assert_eq!(
        GatewayError::RateLimitExceeded.to_string(),
        "Rate limit exceeded. Try again later."
    );
}

#[test]
fn test_gateway_error_from_provider_error_should_keep_message() {
    let provider_error = ProviderError::Blocked("captcha".to_string());
    let gateway_error: GatewayError = provider_error.clone().into();
    assert_eq!(gateway_error.to_string(), provider_error.to_string());
}

#[test]
fn test_status_code_should_map_each_kind() {
    assert_eq!(GatewayError::RateLimitExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(GatewayError::Format("x".to_string()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(GatewayError::Validation("x".to_string()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        GatewayError::Provider(ProviderError::Unknown("x".to_string())).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
