//! Token revocation.
//!
//! Two mechanisms cover logout and credential changes:
//! - individual token ids, kept until the token would have expired anyway;
//! - per-principal cutoffs, which invalidate every token issued before them.
//!
//! A cutoff is dropped once `horizon` seconds have passed since it, since no
//! token issued before it can still be inside its validity window.
use schoolgate_authz::SchoolClaims;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct RevocationList {
    // jti -> exp
    tokens: RwLock<HashMap<String, i64>>,
    // login id -> cutoff (unix seconds)
    cutoffs: RwLock<HashMap<String, i64>>,
    horizon: i64,
}

impl RevocationList {
    /// `horizon` is the longest a token can stay valid after its `iat`.
    pub fn new(horizon: i64) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            cutoffs: RwLock::new(HashMap::new()),
            horizon,
        }
    }

    pub async fn revoke_token(&self, token_id: &str, expires_at: i64, now: i64) {
        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, exp| *exp > now);
        if expires_at > now {
            tokens.insert(token_id.to_string(), expires_at);
        }
    }

    pub async fn revoke_principal(&self, login_id: &str, cutoff: i64, now: i64) {
        let mut cutoffs = self.cutoffs.write().await;
        let horizon = self.horizon;
        cutoffs.retain(|_, at| at.saturating_add(horizon) > now);
        let entry = cutoffs.entry(login_id.to_string()).or_insert(cutoff);
        *entry = (*entry).max(cutoff);
    }

    pub async fn is_revoked(&self, claims: &SchoolClaims) -> bool {
        if self.tokens.read().await.contains_key(&claims.jti) {
            return true;
        }
        match self.cutoffs.read().await.get(&claims.sub) {
            Some(cutoff) => claims.iat < *cutoff,
            None => false,
        }
    }

    pub async fn revoked_token_count(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn cutoff_count(&self) -> usize {
        self.cutoffs.read().await.len()
    }
}
