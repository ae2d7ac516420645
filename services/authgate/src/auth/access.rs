//! Access-check endpoints for resource services.
use crate::api::error::ApiError;
use crate::api::types::AccessRuleListResponse;
use crate::app::AppState;
use crate::auth::bearer::{authenticate, require_access};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use schoolgate_authz::{operations, resources};

/// Access check for resource services that delegate authorization to the gate.
#[utoipa::path(
    get,
    path = "/v1/auth/authorize/{resource}/{operation}",
    tag = "auth",
    security(("bearer" = [])),
    params(
        ("resource" = String, Path, description = "Resource name, e.g. grades"),
        ("operation" = String, Path, description = "Operation name, e.g. write")
    ),
    responses(
        (status = 204, description = "Permitted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Role not permitted")
    )
)]
pub async fn authorize(
    Path((resource, operation)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let principal = authenticate(&state, &headers).await?;
    state.gate.require(&principal, &resource, &operation)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/auth/rules",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Loaded access rules", body = AccessRuleListResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Role not permitted")
    )
)]
pub async fn list_rules(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AccessRuleListResponse>, ApiError> {
    require_access(&state, &headers, resources::RULES, operations::LIST).await?;
    Ok(Json(AccessRuleListResponse {
        items: state.gate.policy().rules().to_vec(),
    }))
}
