//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Keeps every error body in one shape (`code`, `message`, `request_id`) and
//! decides the status for each gate failure.
//!
//! # Key invariants and assumptions
//! - Authentication failures are 401 and carry `WWW-Authenticate: Bearer`.
//! - A role that is not permitted is 403, never 401.
//! - Store conflicts surface as 409 `already_exists`.
//!
//! # Security considerations
//! - Internal errors are logged server-side; clients only see a generic message.
//! - Sign-in failures never say whether the identifier exists.
use crate::api::types::ErrorResponse;
use crate::store::StoreError;
use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::IntoResponse;
use schoolgate_authz::GateError;

/// Structured API error returned by handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let challenge = self.status == StatusCode::UNAUTHORIZED;
        let mut response = (self.status, Json(self.body)).into_response();
        if challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        match &err {
            other if other.is_authentication_failure() => {
                api_error(StatusCode::UNAUTHORIZED, other.code(), &other.to_string())
            }
            GateError::Forbidden(message) => api_forbidden(message),
            other => {
                tracing::error!(error = %other, "gate internal error");
                api_internal_message("internal error")
            }
        }
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

pub fn api_not_found(message: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn api_conflict(code: &str, message: &str) -> ApiError {
    // Caller provides a specific conflict code for precise client handling.
    api_error(StatusCode::CONFLICT, code, message)
}

pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    // Log internal details server-side; return a generic message.
    tracing::error!(error = ?err, "credential storage error");
    api_internal_message(message)
}

pub fn api_internal_message(message: &str) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

pub fn api_forbidden(message: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, "forbidden", message)
}

pub fn api_validation_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Map a store failure to an HTTP error.
///
/// # What it does
/// `NotFound` becomes 404 and `Conflict` becomes 409 `already_exists`, both
/// with the store's detail. Any other failure is logged and returned as a
/// 500 carrying only `message`.
pub fn api_store_error(message: &str, err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(what) => api_not_found(&format!("{what} not found")),
        StoreError::Conflict(what) => api_conflict("already_exists", &what),
        other => api_internal(message, &other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_helpers_build_expected_codes() {
        let not_found = api_not_found("missing");
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.body.code, "not_found");

        let conflict = api_conflict("password_mismatch", "conflict");
        assert_eq!(conflict.status, StatusCode::CONFLICT);
        assert_eq!(conflict.body.code, "password_mismatch");

        let internal = api_internal_message("oops");
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.body.code, "internal");

        let forbidden = api_forbidden("nope");
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
        assert_eq!(forbidden.body.code, "forbidden");

        let validation = api_validation_error("bad");
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation.body.code, "validation_error");
    }

    #[test]
    fn gate_errors_split_into_401_and_403() {
        let expired = ApiError::from(GateError::ExpiredToken);
        assert_eq!(expired.status, StatusCode::UNAUTHORIZED);
        assert_eq!(expired.body.code, "expired_token");

        let credentials = ApiError::from(GateError::InvalidCredentials);
        assert_eq!(credentials.status, StatusCode::UNAUTHORIZED);
        assert_eq!(credentials.body.code, "invalid_credentials");

        let forbidden = ApiError::from(GateError::Forbidden("grades:write".to_string()));
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
        assert_eq!(forbidden.body.message, "grades:write");

        let internal = ApiError::from(GateError::Internal("bcrypt".to_string()));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!internal.body.message.contains("bcrypt"));
    }

    #[test]
    fn unauthorized_responses_carry_bearer_challenge() {
        let response = ApiError::from(GateError::MissingBearer).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE),
            Some(&HeaderValue::from_static("Bearer"))
        );

        let response = api_forbidden("no").into_response();
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn store_errors_map_by_kind() {
        let err = api_store_error("x", StoreError::NotFound("ADM009".to_string()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        let err = api_store_error("x", StoreError::Conflict("dup".to_string()));
        assert_eq!(err.body.code, "already_exists");
        let err = api_store_error("x", StoreError::Unexpected(anyhow::anyhow!("disk")));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
