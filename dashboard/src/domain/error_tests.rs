//! Tests for the domain error payload.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(DomainError::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(DomainError::forbidden("nope"), ErrorCode::Forbidden)]
#[case(DomainError::not_found("gone"), ErrorCode::NotFound)]
#[case(DomainError::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
#[case(DomainError::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_code(#[case] error: DomainError, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = DomainError::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(
        result,
        Err(DomainErrorValidationError::EmptyMessage)
    ));
}

#[rstest]
fn new_substitutes_a_message_when_blank() {
    let error = DomainError::new(ErrorCode::Forbidden, "");
    assert_eq!(error.message(), "permission denied");
}

#[rstest]
fn only_forbidden_counts_as_permission_denied() {
    assert!(DomainError::forbidden("nope").is_permission_denied());
    assert!(!DomainError::internal("boom").is_permission_denied());
}

#[rstest]
fn serialises_with_camel_case_and_details() {
    let error = DomainError::invalid_request("title is required")
        .with_details(json!({ "field": "title" }));

    let value = serde_json::to_value(&error).expect("error serialises");
    assert_eq!(
        value,
        json!({
            "code": "invalid_request",
            "message": "title is required",
            "details": { "field": "title" },
        })
    );
}

#[rstest]
fn deserialising_rejects_blank_messages() {
    let payload = json!({ "code": "not_found", "message": " " });
    let result = serde_json::from_value::<DomainError>(payload);
    assert!(result.is_err());
}
