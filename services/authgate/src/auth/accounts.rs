//! Account credential management: registration, listing, deletion and
//! self-service password changes. Every handler is guarded by the access
//! rules of the account collection it touches.
use crate::api::error::{
    ApiError, api_conflict, api_internal_message, api_not_found, api_store_error,
    api_validation_error,
};
use crate::api::types::{
    AccountListResponse, AccountSummary, PasswordChangeRequest, RegisterAccountRequest,
};
use crate::app::AppState;
use crate::auth::bearer::require_access;
use crate::auth::login_id::{looks_like_email, normalize_email, normalize_login_id};
use crate::store::{Credential, NewCredential};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use schoolgate_authz::{Role, now_epoch_seconds, operations, resources};

pub const MIN_PASSWORD_LEN: usize = 8;

impl From<Credential> for AccountSummary {
    fn from(record: Credential) -> Self {
        AccountSummary {
            login_id: record.login_id,
            role: record.role,
            name: record.name,
            email: record.email,
            created_at: record.created_at,
        }
    }
}

fn role_for_collection(collection: &str) -> Result<Role, ApiError> {
    Role::from_collection(collection)
        .ok_or_else(|| api_not_found(&format!("unknown account collection: {collection}")))
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(api_validation_error(&format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_registration(body: &RegisterAccountRequest) -> Result<(), ApiError> {
    if body.name.trim().is_empty() {
        return Err(api_validation_error("name must not be empty"));
    }
    if !looks_like_email(&body.email) {
        return Err(api_validation_error("email is not a valid address"));
    }
    validate_password(&body.password)
}

#[utoipa::path(
    post,
    path = "/v1/accounts/{collection}",
    tag = "accounts",
    security(("bearer" = [])),
    params(("collection" = String, Path, description = "administrators, teachers, students or parents")),
    request_body = RegisterAccountRequest,
    responses(
        (status = 201, description = "Account registered", body = AccountSummary),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Role not permitted"),
        (status = 404, description = "Unknown collection"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_account(
    Path(collection): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterAccountRequest>,
) -> Result<(StatusCode, Json<AccountSummary>), ApiError> {
    let role = role_for_collection(&collection)?;
    let actor = require_access(&state, &headers, role.collection(), operations::CREATE).await?;
    validate_registration(&body)?;

    let password_hash = state.gate.hasher().hash(&body.password).await?;
    let record = state
        .store
        .register(NewCredential {
            role,
            name: body.name.trim().to_string(),
            email: normalize_email(&body.email),
            password_hash,
        })
        .await
        .map_err(|err| api_store_error("failed to register account", err))?;
    tracing::info!(
        login_id = %record.login_id,
        role = %role,
        registered_by = %actor.id,
        "account registered"
    );
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    get,
    path = "/v1/accounts/{collection}",
    tag = "accounts",
    security(("bearer" = [])),
    params(("collection" = String, Path, description = "administrators, teachers, students or parents")),
    responses(
        (status = 200, description = "Accounts of the collection", body = AccountListResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Role not permitted"),
        (status = 404, description = "Unknown collection")
    )
)]
pub async fn list_accounts(
    Path(collection): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AccountListResponse>, ApiError> {
    let role = role_for_collection(&collection)?;
    require_access(&state, &headers, role.collection(), operations::LIST).await?;
    let items = state
        .store
        .list(role)
        .await
        .map_err(|err| api_store_error("failed to list accounts", err))?;
    Ok(Json(AccountListResponse {
        items: items.into_iter().map(AccountSummary::from).collect(),
    }))
}

#[utoipa::path(
    delete,
    path = "/v1/accounts/{collection}/{login_id}",
    tag = "accounts",
    security(("bearer" = [])),
    params(
        ("collection" = String, Path, description = "administrators, teachers, students or parents"),
        ("login_id" = String, Path, description = "Registration number or parent email")
    ),
    responses(
        (status = 204, description = "Account deleted and its tokens revoked"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Role not permitted"),
        (status = 404, description = "Unknown collection or account")
    )
)]
pub async fn delete_account(
    Path((collection, login_id)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let role = role_for_collection(&collection)?;
    let actor = require_access(&state, &headers, role.collection(), operations::DELETE).await?;

    let login_id = normalize_login_id(&login_id);
    let existing = state
        .store
        .find(&login_id)
        .await
        .map_err(|err| api_store_error("failed to load account", err))?;
    match existing {
        Some(record) if record.role == role => {}
        _ => return Err(api_not_found(&format!("{login_id} not found"))),
    }
    state
        .store
        .delete(&login_id)
        .await
        .map_err(|err| api_store_error("failed to delete account", err))?;
    // The id can be handed to a new account right away, so tokens minted in
    // this same second are cut off too.
    state
        .gate
        .revoke_principal(&login_id, now_epoch_seconds().saturating_add(1))
        .await;
    tracing::info!(login_id = %login_id, deleted_by = %actor.id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/v1/accounts/password",
    tag = "accounts",
    security(("bearer" = [])),
    request_body = PasswordChangeRequest,
    responses(
        (status = 204, description = "Password changed; older tokens revoked"),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Missing or invalid token"),
        (status = 409, description = "Old password wrong or confirmation mismatch")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PasswordChangeRequest>,
) -> Result<StatusCode, ApiError> {
    let principal =
        require_access(&state, &headers, resources::PASSWORDS, operations::UPDATE).await?;
    if body.new_password != body.confirm_password {
        return Err(api_conflict(
            "password_mismatch",
            "new password and confirmation do not match",
        ));
    }
    validate_password(&body.new_password)?;

    let record = state
        .store
        .find(&principal.id)
        .await
        .map_err(|err| api_store_error("failed to load account", err))?
        .ok_or_else(|| api_internal_message("authenticated account vanished"))?;
    if !state
        .gate
        .hasher()
        .verify(&body.old_password, &record.password_hash)
        .await?
    {
        return Err(api_conflict("password_mismatch", "old password is incorrect"));
    }

    let password_hash = state.gate.hasher().hash(&body.new_password).await?;
    state
        .store
        .update_password(&principal.id, password_hash)
        .await
        .map_err(|err| api_store_error("failed to update password", err))?;
    state
        .gate
        .revoke_principal(&principal.id, now_epoch_seconds())
        .await;
    state.gate.logout(&principal).await;
    Ok(StatusCode::NO_CONTENT)
}
