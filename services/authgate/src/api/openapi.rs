//! OpenAPI document for the gate.
//!
//! Served as JSON at `/v1/openapi.json`. Every bearer-protected path refers
//! to the `bearer` security scheme added by `BearerSecurity`.
use crate::api::system;
use crate::api::types::{
    AccessRuleListResponse, AccountListResponse, AccountSummary, ErrorResponse, HealthStatus,
    PasswordChangeRequest, RegisterAccountRequest, SignInRequest, SystemInfo, TokenResponse,
};
use crate::auth::{access, accounts, session};
use axum::Json;
use schoolgate_authz::{AccessRule, Principal, Role};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "schoolgate-authgate",
        version = "v1",
        description = "Authentication and authorization gate for the school management API"
    ),
    paths(
        system::system_info,
        system::system_health,
        session::sign_in,
        session::logout,
        session::me,
        access::authorize,
        access::list_rules,
        accounts::register_account,
        accounts::list_accounts,
        accounts::delete_account,
        accounts::change_password,
    ),
    components(schemas(
        ErrorResponse,
        HealthStatus,
        SystemInfo,
        SignInRequest,
        TokenResponse,
        Principal,
        Role,
        AccessRule,
        AccessRuleListResponse,
        RegisterAccountRequest,
        AccountSummary,
        AccountListResponse,
        PasswordChangeRequest,
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "system", description = "Probes and service information"),
        (name = "auth", description = "Sign-in, token lifecycle and access checks"),
        (name = "accounts", description = "Account credential management")
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub(crate) async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
