//! The auth gate: credential sign-in, token verification and access checks.
//!
//! # Purpose
//! [`AuthGate`] is the single object every request path goes through. It owns
//! the token issuer/verifier pair, the access policy, the revocation list and
//! a handle to the credential store.
//!
//! # Key invariants
//! - `verify` only returns a principal whose token verifies, is inside its
//!   validity window, is not revoked, and whose account still exists with the
//!   role the token claims.
//! - `authorize` is a pure lookup against the loaded access rules.
//! - Failed sign-ins never reveal whether the identifier exists.
//!
//! # Concurrency model
//! Shared behind an `Arc` in the router state. Policy and keys are read-only;
//! revocation and store use async `RwLock`s internally.
use crate::auth::login_id::{normalize_login_id, role_for_login_id};
use crate::auth::password::PasswordHasher;
use crate::auth::revocation::RevocationList;
use crate::observability;
use crate::store::CredentialStore;
use schoolgate_authz::{
    AccessPolicy, AuthzResult, GateError, IssuedToken, Principal, SigningKeySet, TokenIssuer,
    TokenSettings, TokenVerifier, now_epoch_seconds,
};
use std::sync::Arc;

/// Login identifier plus password as presented at sign-in.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub struct AuthGate {
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    policy: Arc<AccessPolicy>,
    store: Arc<dyn CredentialStore>,
    revocations: RevocationList,
    hasher: PasswordHasher,
}

impl AuthGate {
    pub fn new(
        settings: TokenSettings,
        keys: &SigningKeySet,
        policy: Arc<AccessPolicy>,
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
    ) -> AuthzResult<Self> {
        let horizon = i64::try_from(settings.ttl.as_secs())
            .unwrap_or(i64::MAX)
            .saturating_add(i64::try_from(settings.leeway).unwrap_or(i64::MAX));
        Ok(Self {
            issuer: TokenIssuer::new(settings.clone(), keys)?,
            verifier: TokenVerifier::new(settings, keys)?,
            policy,
            store,
            revocations: RevocationList::new(horizon),
            hasher,
        })
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn token_settings(&self) -> &TokenSettings {
        self.issuer.settings()
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub async fn issue(&self, credentials: &Credentials) -> Result<IssuedToken, GateError> {
        self.issue_at(credentials, now_epoch_seconds()).await
    }

    pub async fn issue_at(
        &self,
        credentials: &Credentials,
        now: i64,
    ) -> Result<IssuedToken, GateError> {
        let result = self.check_credentials(credentials, now).await;
        match &result {
            Ok(issued) => {
                observability::record_sign_in("success");
                tracing::info!(
                    login_id = %issued.claims.sub,
                    role = %issued.claims.role,
                    "sign-in succeeded"
                );
            }
            Err(GateError::InvalidCredentials) => {
                observability::record_sign_in("failure");
                tracing::info!(username = %credentials.username, "sign-in rejected");
            }
            Err(err) => {
                observability::record_sign_in("error");
                tracing::error!(error = %err, "sign-in failed");
            }
        }
        result
    }

    async fn check_credentials(
        &self,
        credentials: &Credentials,
        now: i64,
    ) -> Result<IssuedToken, GateError> {
        let login_id = normalize_login_id(&credentials.username);
        if login_id.is_empty() || credentials.password.is_empty() {
            return Err(GateError::InvalidCredentials);
        }
        let record = self
            .store
            .find(&login_id)
            .await
            .map_err(|err| GateError::Internal(format!("credential lookup: {err}")))?
            .ok_or(GateError::InvalidCredentials)?;
        if record.role != role_for_login_id(&login_id) {
            return Err(GateError::InvalidCredentials);
        }
        if !self
            .hasher
            .verify(&credentials.password, &record.password_hash)
            .await?
        {
            return Err(GateError::InvalidCredentials);
        }
        self.issuer
            .issue(&record.login_id, record.role, &record.name, now)
            .map_err(|err| GateError::Internal(format!("sign token: {err}")))
    }

    pub async fn verify(&self, token: &str) -> Result<Principal, GateError> {
        self.verify_at(token, now_epoch_seconds()).await
    }

    pub async fn verify_at(&self, token: &str, now: i64) -> Result<Principal, GateError> {
        let result = self.check_token(token, now).await;
        if let Err(err) = &result {
            observability::record_verify_failure(err.code());
            tracing::debug!(code = err.code(), "token rejected");
        }
        result
    }

    async fn check_token(&self, token: &str, now: i64) -> Result<Principal, GateError> {
        let claims = self.verifier.verify(token, now)?;
        if self.revocations.is_revoked(&claims).await {
            return Err(GateError::RevokedToken);
        }
        let record = self
            .store
            .find(&claims.sub)
            .await
            .map_err(|err| GateError::Internal(format!("credential lookup: {err}")))?;
        match record {
            Some(record) if record.role == claims.role => Ok(Principal::from(claims)),
            _ => Err(GateError::UnknownPrincipal),
        }
    }

    pub fn authorize(&self, principal: &Principal, resource: &str, operation: &str) -> bool {
        let allowed = self.policy.allows(principal.role, resource, operation);
        observability::record_authorize(allowed);
        tracing::debug!(
            login_id = %principal.id,
            role = %principal.role,
            resource,
            operation,
            allowed,
            "access decision"
        );
        allowed
    }

    /// Like [`AuthGate::authorize`], but a denial becomes [`GateError::Forbidden`].
    pub fn require(
        &self,
        principal: &Principal,
        resource: &str,
        operation: &str,
    ) -> Result<(), GateError> {
        if self.authorize(principal, resource, operation) {
            Ok(())
        } else {
            Err(GateError::Forbidden(format!(
                "{} may not {operation} {resource}",
                principal.role
            )))
        }
    }

    /// Revoke the token the principal was authenticated with.
    pub async fn logout(&self, principal: &Principal) {
        self.revocations
            .revoke_token(&principal.token_id, principal.expires_at, now_epoch_seconds())
            .await;
        let outstanding = self.revocations.revoked_token_count().await;
        tracing::info!(login_id = %principal.id, outstanding, "token revoked");
    }

    /// Revoke every token of `login_id` issued before `cutoff`.
    pub async fn revoke_principal(&self, login_id: &str, cutoff: i64) {
        self.revocations
            .revoke_principal(login_id, cutoff, now_epoch_seconds())
            .await;
        tracing::info!(login_id, cutoff, "principal tokens revoked");
    }
}
