//! SchoolGate authn/authz primitives shared by the gate service and its callers.
//!
//! # Purpose
//! Centralizes the role model, the resource access rules (Casbin), and the
//! token issue/verify helpers used to guard the school management API.
//!
//! # How it fits
//! The `authgate` service wires these pieces into an HTTP gate. Resource
//! services only need [`TokenVerifier`] and [`AccessPolicy`] to make the same
//! decisions locally.
//!
//! # Key invariants
//! - Tokens are EdDSA/Ed25519 only; RSA/HS algorithms are rejected.
//! - A token is valid iff its signature verifies and `iat <= now < exp`.
//! - Roles are a closed set: administrator, teacher, student, parent.
//!
//! # Examples
//! ```rust
//! use schoolgate_authz::Role;
//!
//! let role: Role = "teacher".parse().expect("role");
//! assert_eq!(role.as_str(), "teacher");
//! ```
//!
//! # Common pitfalls
//! - Mixing issuer/audience values between issuer and verifier causes every
//!   token to be rejected as malformed.
//! - Access rules with an empty role list deny everyone; they are rejected at
//!   load time instead.

mod casbin_model;
mod errors;
mod keys;
mod policy;
mod principal;
mod resource;
mod role;
mod token;

pub use casbin_model::{casbin_model, casbin_model_string};
pub use errors::{AuthzError, AuthzResult, GateError};
pub use keys::{generate_signing_keys, signing_key_from_seed};
pub use policy::AccessPolicy;
pub use principal::{Principal, SchoolClaims};
pub use resource::{AccessRule, AccessRuleFile, default_rules, operations, resources};
pub use role::Role;
pub use token::{
    ED25519_KEY_LEN, IssuedToken, SigningKey, SigningKeySet, TokenIssuer, TokenSettings,
    TokenVerifier, now_epoch_seconds,
};
