//! Sign-in, logout and whoami endpoints.
//!
//! # Purpose
//! Exchanges a login identifier and password for a signed access token,
//! revokes the presented token on logout, and echoes the verified principal.
//!
//! # Notes
//! Sign-in accepts a JSON body or the OAuth2 password form
//! (`application/x-www-form-urlencoded`); `grant_type` and other extra fields
//! are ignored. The token is also returned as an HttpOnly `token` cookie.
use crate::api::error::{ApiError, api_internal_message, api_validation_error};
use crate::api::types::{SignInRequest, TokenResponse};
use crate::app::AppState;
use crate::auth::bearer::authenticate;
use crate::auth::gate::Credentials;
use axum::Json;
use axum::extract::{Form, FromRequest, Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use schoolgate_authz::Principal;

pub const TOKEN_COOKIE: &str = "token";

/// `Set-Cookie` value carrying the access token for browser clients.
///
/// The cookie is HttpOnly and lives as long as the token. Requests are still
/// authenticated from the `Authorization` header only.
pub fn token_cookie(token: &str, max_age_secs: u64) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!(
        "{TOKEN_COOKIE}={token}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax"
    ))
    .map_err(|_| api_internal_message("failed to build token cookie"))
}

fn expired_token_cookie() -> HeaderValue {
    HeaderValue::from_static("token=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

#[utoipa::path(
    post,
    path = "/v1/auth/token/sign-in",
    tag = "auth",
    request_body(
        content = SignInRequest,
        description = "JSON body or application/x-www-form-urlencoded OAuth2 password form"
    ),
    responses(
        (status = 200, description = "Signed access token", body = TokenResponse,
            headers(("set-cookie" = String, description = "HttpOnly `token` cookie with the same token"))),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    request: Request,
) -> Result<([(header::HeaderName, HeaderValue); 1], Json<TokenResponse>), ApiError> {
    let body = read_sign_in(&state, request).await?;
    let issued = state
        .gate
        .issue(&Credentials {
            username: body.username,
            password: body.password,
        })
        .await?;
    let expires_in = state.gate.token_settings().ttl.as_secs();
    let cookie = token_cookie(&issued.token, expires_in)?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(TokenResponse {
            access_token: issued.token,
            token_type: "bearer".to_string(),
            expires_in,
            id: issued.claims.sub,
            name: issued.claims.name,
            role: issued.claims.role,
        }),
    ))
}

async fn read_sign_in(state: &AppState, request: Request) -> Result<SignInRequest, ApiError> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));
    if is_form {
        let Form(body) = Form::<SignInRequest>::from_request(request, state)
            .await
            .map_err(|err| api_validation_error(&err.body_text()))?;
        Ok(body)
    } else {
        let Json(body) = Json::<SignInRequest>::from_request(request, state)
            .await
            .map_err(|err| api_validation_error(&err.body_text()))?;
        Ok(body)
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Token revoked and the `token` cookie cleared"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, [(header::HeaderName, HeaderValue); 1]), ApiError> {
    let principal = authenticate(&state, &headers).await?;
    state.gate.logout(&principal).await;
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, expired_token_cookie())],
    ))
}

#[utoipa::path(
    get,
    path = "/v1/auth/me",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Authenticated principal", body = Principal),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Principal>, ApiError> {
    Ok(Json(authenticate(&state, &headers).await?))
}
