//! Credential storage abstraction.
//!
//! # Purpose
//! The gate only needs to look up, register, re-hash and delete login
//! credentials; [`CredentialStore`] is that surface. Resource data (grades,
//! classes, news) lives elsewhere.
//!
//! # Key invariants
//! - Login ids are unique across the store; registration numbers are never
//!   reused, a parent id is their e-mail.
//! - An e-mail address is registered at most once per role.
use async_trait::async_trait;
use schoolgate_authz::Role;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;

/// Login credentials of one account. `password_hash` is a bcrypt hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub login_id: String,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
}

/// Registration input; the store assigns `login_id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub role: Role,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Store failures. `NotFound` and `Conflict` are client-visible; anything
/// else is an internal error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new account and return it with its generated login identifier.
    ///
    /// # Errors
    /// - `Conflict` when the e-mail is already registered for the same role.
    async fn register(&self, credential: NewCredential) -> StoreResult<Credential>;
    async fn find(&self, login_id: &str) -> StoreResult<Option<Credential>>;
    /// Replace the stored hash. `NotFound` if the account is gone.
    async fn update_password(&self, login_id: &str, password_hash: String) -> StoreResult<()>;
    /// Remove the account and return what was stored.
    async fn delete(&self, login_id: &str) -> StoreResult<Credential>;
    /// Accounts of one role, ordered by login id.
    async fn list(&self, role: Role) -> StoreResult<Vec<Credential>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
