//! HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, the shared state injected into handlers, and the
//! startup sequence that turns a [`GateConfig`] into a running gate.
use crate::api;
use crate::auth;
use crate::auth::gate::AuthGate;
use crate::auth::password::PasswordHasher;
use crate::config::{BootstrapAdmin, GateConfig};
use crate::store::memory::InMemoryStore;
use crate::store::{CredentialStore, NewCredential};
use anyhow::Context;
use axum::Router;
use schoolgate_authz::{
    AccessPolicy, Role, SigningKeySet, generate_signing_keys, signing_key_from_seed,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
    pub store: Arc<dyn CredentialStore>,
    pub api_version: String,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            )
        });

    Router::new()
        .route(
            "/v1/system/info",
            axum::routing::get(api::system::system_info),
        )
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/v1/openapi.json",
            axum::routing::get(api::openapi::openapi_json),
        )
        .route(
            "/v1/auth/token/sign-in",
            axum::routing::post(auth::session::sign_in),
        )
        .route("/v1/auth/logout", axum::routing::post(auth::session::logout))
        .route("/v1/auth/me", axum::routing::get(auth::session::me))
        .route(
            "/v1/auth/authorize/:resource/:operation",
            axum::routing::get(auth::access::authorize),
        )
        .route("/v1/auth/rules", axum::routing::get(auth::access::list_rules))
        .route(
            "/v1/accounts/password",
            axum::routing::put(auth::accounts::change_password),
        )
        .route(
            "/v1/accounts/:collection",
            axum::routing::get(auth::accounts::list_accounts)
                .post(auth::accounts::register_account),
        )
        .route(
            "/v1/accounts/:collection/:login_id",
            axum::routing::delete(auth::accounts::delete_account),
        )
        .layer(trace_layer)
        .with_state(state)
}

/// Wire the gate from configuration.
///
/// # What it does
/// Loads the access rules (file or built-in table), derives the signing key
/// from the configured seed or generates one, creates the credential store and
/// the [`AuthGate`], then registers the bootstrap administrator if configured.
///
/// # Errors
/// - The access-rule file cannot be read, parsed or compiled into a policy.
/// - Signing key material is inconsistent.
/// - The bootstrap administrator cannot be hashed or stored.
pub async fn build_state(config: &GateConfig) -> anyhow::Result<AppState> {
    let rules = config.load_access_rules()?;
    let policy = AccessPolicy::from_rules(&rules)
        .await
        .map_err(|err| anyhow::anyhow!("build access policy: {err}"))?;
    let keys = signing_keys(config);
    let store: Arc<dyn CredentialStore> = Arc::new(InMemoryStore::new());
    let hasher = PasswordHasher::new(config.bcrypt_cost);
    let bcrypt_cost = hasher.cost();
    let gate = AuthGate::new(
        config.token_settings(),
        &keys,
        Arc::new(policy),
        store.clone(),
        hasher,
    )
    .map_err(|err| anyhow::anyhow!("build auth gate: {err}"))?;
    tracing::info!(
        rules = rules.len(),
        bcrypt_cost,
        kid = %keys.current.kid,
        backend = store.backend_name(),
        "auth gate ready"
    );

    let state = AppState {
        gate: Arc::new(gate),
        store,
        api_version: "v1".to_string(),
    };
    if let Some(admin) = &config.bootstrap_admin {
        seed_administrator(&state, admin).await?;
    }
    Ok(state)
}

fn signing_keys(config: &GateConfig) -> SigningKeySet {
    match &config.signing_seed {
        Some(seed) => {
            let mut key = signing_key_from_seed(seed, String::new());
            key.kid = hex::encode(&key.public_key[..8]);
            SigningKeySet {
                current: key,
                previous: Vec::new(),
            }
        }
        None => {
            tracing::warn!("no signing seed configured; tokens will not survive a restart");
            generate_signing_keys()
        }
    }
}

/// Register the bootstrap administrator unless one already exists.
pub async fn seed_administrator(state: &AppState, admin: &BootstrapAdmin) -> anyhow::Result<()> {
    let existing = state
        .store
        .list(Role::Administrator)
        .await
        .context("list administrators")?;
    if !existing.is_empty() {
        return Ok(());
    }
    let password_hash = state
        .gate
        .hasher()
        .hash(&admin.password)
        .await
        .map_err(|err| anyhow::anyhow!("hash bootstrap password: {err}"))?;
    let record = state
        .store
        .register(NewCredential {
            role: Role::Administrator,
            name: admin.name.clone(),
            email: admin.email.clone(),
            password_hash,
        })
        .await
        .context("register bootstrap administrator")?;
    tracing::info!(login_id = %record.login_id, "bootstrap administrator created");
    Ok(())
}
