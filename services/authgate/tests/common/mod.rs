#![allow(dead_code)]

use authgate::app::{AppState, build_router, build_state};
use authgate::config::{
    ENV_BCRYPT_COST, ENV_BOOTSTRAP_ADMIN_EMAIL, ENV_BOOTSTRAP_ADMIN_PASSWORD, ENV_SIGNING_SEED,
    GateConfig,
};
use axum::body::Body;
use axum::http::StatusCode;
use axum::routing::RouterIntoService;
use tower::ServiceExt;

pub const ADMIN_ID: &str = "ADM001";
pub const ADMIN_EMAIL: &str = "office@school.example";
pub const ADMIN_PASSWORD: &str = "principal-pass";
pub const SEED_HEX: &str = "0707070707070707070707070707070707070707070707070707070707070707";

pub type App = RouterIntoService<Body, ()>;

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn test_config() -> GateConfig {
    GateConfig::from_lookup(|key| match key {
        ENV_BCRYPT_COST => Some("4".to_string()),
        ENV_SIGNING_SEED => Some(SEED_HEX.to_string()),
        ENV_BOOTSTRAP_ADMIN_EMAIL => Some(ADMIN_EMAIL.to_string()),
        ENV_BOOTSTRAP_ADMIN_PASSWORD => Some(ADMIN_PASSWORD.to_string()),
        _ => None,
    })
    .expect("config")
}

pub async fn test_app() -> (App, AppState) {
    let state = build_state(&test_config()).await.expect("state");
    (build_router(state.clone()).into_service(), state)
}

pub async fn sign_in(app: &App, username: &str, password: &str) -> String {
    let request = crate::http_helpers::json_request(
        "POST",
        "/v1/auth/token/sign-in",
        serde_json::json!({ "username": username, "password": password }),
    );
    let response = app.clone().oneshot(request).await.expect("sign-in");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    body["access_token"].as_str().expect("token").to_string()
}

/// Register an account through the API and return its login id.
pub async fn register(
    app: &App,
    token: &str,
    collection: &str,
    name: &str,
    email: &str,
    password: &str,
) -> String {
    let request = crate::http_helpers::bearer_json_request(
        "POST",
        &format!("/v1/accounts/{collection}"),
        token,
        serde_json::json!({ "name": name, "email": email, "password": password }),
    );
    let response = app.clone().oneshot(request).await.expect("register");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    body["login_id"].as_str().expect("login id").to_string()
}
