//! Signing key generation for gate tokens.
//!
//! # Key invariants
//! - Keys are always Ed25519.
//! - The private key is a raw 32-byte seed; the public key is derived from it.
//! - `kid` values are random hex and are not secret.
use crate::{ED25519_KEY_LEN, SigningKey, SigningKeySet};
use ed25519_dalek::SigningKey as Ed25519SigningKey;
use jsonwebtoken::Algorithm;
use rand::RngCore;

/// Generate a fresh key set with one current key and no previous keys.
///
/// # Examples
/// ```rust
/// use schoolgate_authz::generate_signing_keys;
///
/// let keys = generate_signing_keys();
/// assert!(keys.previous.is_empty());
/// assert!(keys.validate().is_ok());
/// ```
pub fn generate_signing_keys() -> SigningKeySet {
    let mut seed = [0u8; ED25519_KEY_LEN];
    rand::thread_rng().fill_bytes(&mut seed);
    SigningKeySet {
        current: signing_key_from_seed(&seed, random_kid()),
        previous: Vec::new(),
    }
}

/// Build a signing key from a known seed, e.g. one loaded from configuration.
pub fn signing_key_from_seed(seed: &[u8; ED25519_KEY_LEN], kid: impl Into<String>) -> SigningKey {
    let signing_key = Ed25519SigningKey::from_bytes(seed);
    SigningKey {
        kid: kid.into(),
        alg: Algorithm::EdDSA,
        private_key: *seed,
        public_key: signing_key.verifying_key().to_bytes(),
    }
}

fn random_kid() -> String {
    let mut kid_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut kid_bytes);
    hex::encode(kid_bytes)
}
