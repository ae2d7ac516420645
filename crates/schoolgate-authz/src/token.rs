//! Ed25519 JWT issue and verification for gate tokens.
//!
//! # Purpose
//! Mint short-lived bearer tokens after a successful sign-in and turn a
//! presented token back into [`SchoolClaims`] with a precise failure reason.
//!
//! # Key invariants
//! - Only `EdDSA` is accepted; a token whose header names any other algorithm
//!   fails with [`GateError::InvalidSignature`].
//! - The signature is checked before any claim is trusted.
//! - Validity window is `iat - leeway <= now < exp`.
//! - Key material is derived once when an issuer/verifier is built and is held
//!   by that instance only.
//!
//! # Security boundary
//! Private seeds never leave [`SigningKey`]; its `Debug` output is redacted.
use crate::{AuthzError, AuthzResult, GateError, Role, SchoolClaims};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::SigningKey as Ed25519SigningKey;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const ED25519_KEY_LEN: usize = 32;

/// Ed25519 key material plus its `kid`.
#[derive(Clone)]
pub struct SigningKey {
    pub kid: String,
    pub alg: Algorithm,
    pub private_key: [u8; ED25519_KEY_LEN],
    pub public_key: [u8; ED25519_KEY_LEN],
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("alg", &self.alg)
            .field("private_key", &"<redacted>")
            .field("public_key", &hex::encode(self.public_key))
            .finish()
    }
}

impl SigningKey {
    /// Reject non-EdDSA keys and seeds whose derived public key does not match.
    pub fn validate(&self) -> AuthzResult<()> {
        if self.alg != Algorithm::EdDSA {
            return Err(AuthzError::Key(format!(
                "invalid signing algorithm: {:?}",
                self.alg
            )));
        }
        let signing_key = Ed25519SigningKey::from_bytes(&self.private_key);
        if signing_key.verifying_key().to_bytes() != self.public_key {
            return Err(AuthzError::Key(
                "Ed25519 public key does not match private seed".to_string(),
            ));
        }
        Ok(())
    }

    fn encoding_key(&self) -> AuthzResult<EncodingKey> {
        let signing_key = Ed25519SigningKey::from_bytes(&self.private_key);
        let der = signing_key
            .to_pkcs8_der()
            .map_err(|err| AuthzError::Key(format!("encode Ed25519 key: {err}")))?;
        Ok(EncodingKey::from_ed_der(der.as_bytes()))
    }

    fn decoding_key(&self) -> AuthzResult<DecodingKey> {
        let x = URL_SAFE_NO_PAD.encode(self.public_key);
        Ok(DecodingKey::from_ed_components(&x)?)
    }
}

/// Current signing key plus previous keys still accepted for verification.
#[derive(Debug, Clone)]
pub struct SigningKeySet {
    pub current: SigningKey,
    pub previous: Vec<SigningKey>,
}

impl SigningKeySet {
    pub fn validate(&self) -> AuthzResult<()> {
        self.current.validate()?;
        for key in &self.previous {
            key.validate()?;
        }
        Ok(())
    }

    /// Current key first, then previous keys in rotation order.
    pub fn all_keys(&self) -> impl Iterator<Item = &SigningKey> {
        std::iter::once(&self.current).chain(self.previous.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSettings {
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
    /// Allowed clock skew, in seconds, for tokens whose `iat` is in the future.
    pub leeway: u64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            issuer: "schoolgate-auth".to_string(),
            audience: "schoolgate-api".to_string(),
            ttl: Duration::from_secs(30 * 60),
            leeway: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: SchoolClaims,
}

pub struct TokenIssuer {
    settings: TokenSettings,
    kid: String,
    encoding_key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(settings: TokenSettings, keys: &SigningKeySet) -> AuthzResult<Self> {
        keys.validate()?;
        Ok(Self {
            encoding_key: keys.current.encoding_key()?,
            kid: keys.current.kid.clone(),
            settings,
        })
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Sign a token for `subject`, valid from `now` for the configured ttl.
    pub fn issue(&self, subject: &str, role: Role, name: &str, now: i64) -> AuthzResult<IssuedToken> {
        let ttl = i64::try_from(self.settings.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = SchoolClaims {
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            sub: subject.to_string(),
            role,
            name: name.to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
            jti: uuid::Uuid::new_v4().to_string(),
        };
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(self.kid.clone());
        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key)?;
        Ok(IssuedToken { token, claims })
    }
}

struct VerificationKey {
    kid: String,
    decoding_key: DecodingKey,
}

pub struct TokenVerifier {
    settings: TokenSettings,
    keys: Vec<VerificationKey>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(settings: TokenSettings, keys: &SigningKeySet) -> AuthzResult<Self> {
        keys.validate()?;
        let keys = keys
            .all_keys()
            .map(|key| {
                Ok(VerificationKey {
                    kid: key.kid.clone(),
                    decoding_key: key.decoding_key()?,
                })
            })
            .collect::<AuthzResult<Vec<_>>>()?;

        // Expiry and issued-at are checked by hand so each maps to its own error.
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();
        Ok(Self {
            settings,
            keys,
            validation,
        })
    }

    pub fn verify(&self, token: &str, now: i64) -> Result<SchoolClaims, GateError> {
        let header = jsonwebtoken::decode_header(token).map_err(|_| GateError::MalformedToken)?;
        if header.alg != Algorithm::EdDSA {
            return Err(GateError::InvalidSignature);
        }

        let kid = header.kid.as_deref();
        let ordered = self
            .keys
            .iter()
            .filter(|key| Some(key.kid.as_str()) == kid)
            .chain(self.keys.iter().filter(|key| Some(key.kid.as_str()) != kid));

        for key in ordered {
            match jsonwebtoken::decode::<SchoolClaims>(token, &key.decoding_key, &self.validation) {
                Ok(data) => return self.check_window(data.claims, now),
                Err(err) if matches!(err.kind(), ErrorKind::InvalidSignature) => continue,
                // The signature verified under this key, so the failure is in the claims.
                Err(err) => return Err(map_jwt_error(&err)),
            }
        }
        Err(GateError::InvalidSignature)
    }

    fn check_window(&self, claims: SchoolClaims, now: i64) -> Result<SchoolClaims, GateError> {
        let leeway = i64::try_from(self.settings.leeway).unwrap_or(i64::MAX);
        if claims.iat > now.saturating_add(leeway) {
            return Err(GateError::TokenNotYetValid);
        }
        if now >= claims.exp {
            return Err(GateError::ExpiredToken);
        }
        Ok(claims)
    }
}

fn map_jwt_error(err: &jsonwebtoken::errors::Error) -> GateError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::Crypto(_) => {
            GateError::InvalidSignature
        }
        ErrorKind::ExpiredSignature => GateError::ExpiredToken,
        ErrorKind::ImmatureSignature => GateError::TokenNotYetValid,
        _ => GateError::MalformedToken,
    }
}

pub fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
        .try_into()
        .unwrap_or(i64::MAX)
}
