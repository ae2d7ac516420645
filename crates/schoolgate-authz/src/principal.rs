//! Principal and claim shapes.
//!
//! # Purpose
//! [`SchoolClaims`] is the exact JWT payload; [`Principal`] is what the gate
//! hands to callers after verification.
//!
//! # Key invariants
//! - `sub` is the login identifier (registration number or parent e-mail).
//! - `jti` is unique per issued token and is the revocation handle.
use crate::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub role: Role,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    pub id: String,
    pub role: Role,
    pub name: String,
    pub issued_at: i64,
    pub expires_at: i64,
    pub token_id: String,
}

impl From<SchoolClaims> for Principal {
    fn from(claims: SchoolClaims) -> Self {
        Principal {
            id: claims.sub,
            role: claims.role,
            name: claims.name,
            issued_at: claims.iat,
            expires_at: claims.exp,
            token_id: claims.jti,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_from_claims_keeps_identity() {
        let claims = SchoolClaims {
            iss: "schoolgate-auth".to_string(),
            aud: "schoolgate-api".to_string(),
            sub: "TCH26001".to_string(),
            role: Role::Teacher,
            name: "Grace Hopper".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_001_800,
            jti: "token-1".to_string(),
        };
        let principal = Principal::from(claims);
        assert_eq!(principal.id, "TCH26001");
        assert_eq!(principal.role, Role::Teacher);
        assert_eq!(principal.expires_at - principal.issued_at, 1_800);
        assert_eq!(principal.token_id, "token-1");
    }
}
