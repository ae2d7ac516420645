use thiserror::Error;

/// Configuration-time failures: bad key material, invalid rules, Casbin setup.
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("invalid role: {0}")]
    InvalidRole(String),
    #[error("invalid access rule: {0}")]
    InvalidRule(String),
    #[error("key error: {0}")]
    Key(String),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("policy error: {0}")]
    Policy(#[from] casbin::Error),
}

pub type AuthzResult<T> = Result<T, AuthzError>;

/// Request-time failures of the gate.
///
/// Every variant except [`GateError::Forbidden`] and [`GateError::Internal`]
/// is an authentication failure and surfaces as HTTP 401.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("token has expired")]
    ExpiredToken,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is malformed")]
    MalformedToken,
    #[error("token has been revoked")]
    RevokedToken,
    #[error("token is not valid yet")]
    TokenNotYetValid,
    #[error("principal no longer exists")]
    UnknownPrincipal,
    #[error("missing bearer token")]
    MissingBearer,
    #[error("{0}")]
    Forbidden(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Stable machine-readable code for error bodies and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            GateError::InvalidCredentials => "invalid_credentials",
            GateError::ExpiredToken => "expired_token",
            GateError::InvalidSignature => "invalid_signature",
            GateError::MalformedToken => "malformed_token",
            GateError::RevokedToken => "revoked_token",
            GateError::TokenNotYetValid => "token_not_yet_valid",
            GateError::UnknownPrincipal => "unknown_principal",
            GateError::MissingBearer => "missing_bearer_token",
            GateError::Forbidden(_) => "forbidden",
            GateError::Internal(_) => "internal",
        }
    }

    pub fn is_authentication_failure(&self) -> bool {
        !matches!(self, GateError::Forbidden(_) | GateError::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let errors = vec![
            AuthzError::InvalidRole("janitor".to_string()),
            AuthzError::InvalidRule("empty roles".to_string()),
            AuthzError::Key("mismatch".to_string()),
        ];
        for error in errors {
            assert!(!error.to_string().is_empty());
        }
    }

    #[test]
    fn gate_error_codes_are_distinct() {
        let errors = [
            GateError::InvalidCredentials,
            GateError::ExpiredToken,
            GateError::InvalidSignature,
            GateError::MalformedToken,
            GateError::RevokedToken,
            GateError::TokenNotYetValid,
            GateError::UnknownPrincipal,
            GateError::MissingBearer,
            GateError::Forbidden("nope".to_string()),
            GateError::Internal("boom".to_string()),
        ];
        let codes: std::collections::HashSet<&str> = errors.iter().map(GateError::code).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn forbidden_is_not_an_authentication_failure() {
        assert!(GateError::ExpiredToken.is_authentication_failure());
        assert!(GateError::MissingBearer.is_authentication_failure());
        assert!(!GateError::Forbidden("grades:write".to_string()).is_authentication_failure());
        assert!(!GateError::Internal("store".to_string()).is_authentication_failure());
    }
}
