//! bcrypt password hashing.
//!
//! Hashing and verification run on the blocking pool; bcrypt at production
//! cost takes long enough to stall a runtime worker otherwise.
use schoolgate_authz::GateError;

/// bcrypt hashing with a fixed cost, run off the async executor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// # Errors
    /// - [`GateError::Internal`] if bcrypt fails or the blocking task panics.
    pub async fn hash(&self, password: &str) -> Result<String, GateError> {
        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|err| GateError::Internal(format!("hash task failed: {err}")))?
            .map_err(|err| GateError::Internal(format!("hash password: {err}")))
    }

    /// `Ok(false)` for a wrong password; a corrupt stored hash is an internal error.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, GateError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|err| GateError::Internal(format!("verify task failed: {err}")))?
            .map_err(|err| GateError::Internal(format!("verify password: {err}")))
    }
}
