//! Bearer token extraction for handlers.
//!
//! # Purpose
//! Handlers call [`authenticate`] or [`require_access`] with their request
//! headers instead of going through a middleware layer, so each route states
//! the resource and operation it guards.
use crate::api::error::ApiError;
use crate::app::AppState;
use axum::http::HeaderMap;
use schoolgate_authz::{GateError, Principal};

/// Token from `Authorization: Bearer <token>`; the scheme is case-insensitive.
///
/// # Errors
/// - [`GateError::MissingBearer`] when the header is absent, not ASCII, uses
///   another scheme, or carries an empty token.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, GateError> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(GateError::MissingBearer)?;
    let (scheme, token) = value.trim().split_once(' ').ok_or(GateError::MissingBearer)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(GateError::MissingBearer);
    }
    Ok(token)
}

/// Verify the bearer token and return its principal.
///
/// Every verification failure becomes a 401 with the gate's error code.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Principal, ApiError> {
    let token = extract_bearer(headers)?;
    Ok(state.gate.verify(token).await?)
}

/// Authenticate, then require `resource:operation` for the caller's role.
pub async fn require_access(
    state: &AppState,
    headers: &HeaderMap,
    resource: &str,
    operation: &str,
) -> Result<Principal, ApiError> {
    let principal = authenticate(state, headers).await?;
    state.gate.require(&principal, resource, operation)?;
    Ok(principal)
}
