//! Gate configuration.
//!
//! # Purpose
//! Reads listener addresses, token settings, bcrypt cost, the signing seed,
//! the access-rule file and the bootstrap administrator from `SCHOOLGATE_*`
//! environment variables. A YAML file named by `SCHOOLGATE_CONFIG` may then
//! override the non-secret values.
//!
//! # Key invariants
//! - Every constructor ends in `validate`, so a `GateConfig` in hand is in range.
//! - Token lifetime is between one minute and one year; leeway is at most five minutes.
//! - Secrets (seed, bootstrap password) are never read from the YAML file and
//!   never printed by `Debug`.
use anyhow::{Context, Result, bail};
use schoolgate_authz::{AccessRule, AccessRuleFile, ED25519_KEY_LEN, TokenSettings, default_rules};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_BIND: &str = "SCHOOLGATE_BIND";
pub const ENV_METRICS_BIND: &str = "SCHOOLGATE_METRICS_BIND";
pub const ENV_CONFIG: &str = "SCHOOLGATE_CONFIG";
pub const ENV_TOKEN_ISSUER: &str = "SCHOOLGATE_TOKEN_ISSUER";
pub const ENV_TOKEN_AUDIENCE: &str = "SCHOOLGATE_TOKEN_AUDIENCE";
pub const ENV_TOKEN_EXPIRE_MINUTES: &str = "SCHOOLGATE_ACCESS_TOKEN_EXPIRE_MINUTES";
pub const ENV_TOKEN_LEEWAY_SECS: &str = "SCHOOLGATE_TOKEN_LEEWAY_SECS";
pub const ENV_SIGNING_SEED: &str = "SCHOOLGATE_SIGNING_SEED";
pub const ENV_BCRYPT_COST: &str = "SCHOOLGATE_BCRYPT_COST";
pub const ENV_ACCESS_RULES: &str = "SCHOOLGATE_ACCESS_RULES";
pub const ENV_BOOTSTRAP_ADMIN_EMAIL: &str = "SCHOOLGATE_BOOTSTRAP_ADMIN_EMAIL";
pub const ENV_BOOTSTRAP_ADMIN_NAME: &str = "SCHOOLGATE_BOOTSTRAP_ADMIN_NAME";
pub const ENV_BOOTSTRAP_ADMIN_PASSWORD: &str = "SCHOOLGATE_BOOTSTRAP_ADMIN_PASSWORD";

const DEFAULT_EXPIRE_MINUTES: u64 = 30;
const DEFAULT_LEEWAY_SECS: u64 = 5;
const MAX_EXPIRE_MINUTES: u64 = 365 * 24 * 60;
const MAX_LEEWAY_SECS: u64 = 300;
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

/// First administrator account, created at startup when the store has none.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

// Gate configuration sourced from environment variables, optionally
// overridden by a YAML file.
#[derive(Clone)]
pub struct GateConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub token_issuer: String,
    pub token_audience: String,
    pub token_expire_minutes: u64,
    pub token_leeway_secs: u64,
    pub signing_seed: Option<[u8; ED25519_KEY_LEN]>,
    pub bcrypt_cost: u32,
    pub access_rules_path: Option<PathBuf>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl std::fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateConfig")
            .field("bind_addr", &self.bind_addr)
            .field("metrics_bind", &self.metrics_bind)
            .field("token_issuer", &self.token_issuer)
            .field("token_audience", &self.token_audience)
            .field("token_expire_minutes", &self.token_expire_minutes)
            .field("token_leeway_secs", &self.token_leeway_secs)
            .field("signing_seed", &self.signing_seed.map(|_| "<redacted>"))
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("access_rules_path", &self.access_rules_path)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct GateConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    token_issuer: Option<String>,
    token_audience: Option<String>,
    token_expire_minutes: Option<u64>,
    token_leeway_secs: Option<u64>,
    bcrypt_cost: Option<u32>,
    access_rules_path: Option<PathBuf>,
}

impl GateConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr: SocketAddr = lookup(ENV_BIND)
            .unwrap_or_else(|| "0.0.0.0:8443".to_string())
            .parse()
            .with_context(|| format!("parse {ENV_BIND}"))?;
        let metrics_bind: SocketAddr = lookup(ENV_METRICS_BIND)
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| format!("parse {ENV_METRICS_BIND}"))?;
        let token_expire_minutes: u64 = match lookup(ENV_TOKEN_EXPIRE_MINUTES) {
            Some(value) => value
                .parse()
                .with_context(|| format!("parse {ENV_TOKEN_EXPIRE_MINUTES}"))?,
            None => DEFAULT_EXPIRE_MINUTES,
        };
        let token_leeway_secs: u64 = match lookup(ENV_TOKEN_LEEWAY_SECS) {
            Some(value) => value
                .parse()
                .with_context(|| format!("parse {ENV_TOKEN_LEEWAY_SECS}"))?,
            None => DEFAULT_LEEWAY_SECS,
        };
        let bcrypt_cost: u32 = match lookup(ENV_BCRYPT_COST) {
            Some(value) => value
                .parse()
                .with_context(|| format!("parse {ENV_BCRYPT_COST}"))?,
            None => bcrypt::DEFAULT_COST,
        };
        let signing_seed = lookup(ENV_SIGNING_SEED)
            .map(|value| parse_seed(&value))
            .transpose()
            .with_context(|| format!("parse {ENV_SIGNING_SEED}"))?;
        let bootstrap_admin = match (
            lookup(ENV_BOOTSTRAP_ADMIN_EMAIL),
            lookup(ENV_BOOTSTRAP_ADMIN_PASSWORD),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                email,
                name: lookup(ENV_BOOTSTRAP_ADMIN_NAME)
                    .unwrap_or_else(|| "Administrator".to_string()),
                password,
            }),
            (None, None) => None,
            _ => bail!(
                "{ENV_BOOTSTRAP_ADMIN_EMAIL} and {ENV_BOOTSTRAP_ADMIN_PASSWORD} must be set together"
            ),
        };

        let config = Self {
            bind_addr,
            metrics_bind,
            token_issuer: lookup(ENV_TOKEN_ISSUER).unwrap_or_else(|| "schoolgate-auth".to_string()),
            token_audience: lookup(ENV_TOKEN_AUDIENCE)
                .unwrap_or_else(|| "schoolgate-api".to_string()),
            token_expire_minutes,
            token_leeway_secs,
            signing_seed,
            bcrypt_cost,
            access_rules_path: lookup(ENV_ACCESS_RULES).map(PathBuf::from),
            bootstrap_admin,
        };
        config.validate()?;
        Ok(config)
    }

    /// Environment first, then the optional `SCHOOLGATE_CONFIG` YAML overrides.
    ///
    /// # Errors
    /// - Any unparsable or out-of-range value, or an unreadable YAML file.
    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var(ENV_CONFIG) {
            config.apply_yaml_file(Path::new(&path))?;
        }
        Ok(config)
    }

    pub fn apply_yaml_file(&mut self, path: &Path) -> Result<()> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read {ENV_CONFIG}: {}", path.display()))?;
        let override_cfg: GateConfigOverride =
            serde_yaml::from_str(&contents).with_context(|| "parse gate config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.token_issuer {
            self.token_issuer = value;
        }
        if let Some(value) = override_cfg.token_audience {
            self.token_audience = value;
        }
        if let Some(value) = override_cfg.token_expire_minutes {
            self.token_expire_minutes = value;
        }
        if let Some(value) = override_cfg.token_leeway_secs {
            self.token_leeway_secs = value;
        }
        if let Some(value) = override_cfg.bcrypt_cost {
            self.bcrypt_cost = value;
        }
        if let Some(value) = override_cfg.access_rules_path {
            self.access_rules_path = Some(value);
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if !(1..=MAX_EXPIRE_MINUTES).contains(&self.token_expire_minutes) {
            bail!("token lifetime must be between 1 and {MAX_EXPIRE_MINUTES} minutes");
        }
        if self.token_leeway_secs > MAX_LEEWAY_SECS {
            bail!("token leeway must be at most {MAX_LEEWAY_SECS} seconds");
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            bail!("bcrypt cost must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}");
        }
        if self.token_issuer.is_empty() || self.token_audience.is_empty() {
            bail!("token issuer and audience must not be empty");
        }
        Ok(())
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            issuer: self.token_issuer.clone(),
            audience: self.token_audience.clone(),
            ttl: Duration::from_secs(self.token_expire_minutes.saturating_mul(60)),
            leeway: self.token_leeway_secs,
        }
    }

    /// Access rules from `access_rules_path`, or the built-in table.
    pub fn load_access_rules(&self) -> Result<Vec<AccessRule>> {
        match &self.access_rules_path {
            Some(path) => load_access_rules(path),
            None => Ok(default_rules()),
        }
    }
}

/// Read an access-rule YAML file (`rules: [{resource, operation, roles}]`).
///
/// A file with no rules is an error rather than a deny-everything policy.
pub fn load_access_rules(path: &Path) -> Result<Vec<AccessRule>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read access rules: {}", path.display()))?;
    let file: AccessRuleFile =
        serde_yaml::from_str(&contents).with_context(|| "parse access rules yaml")?;
    if file.rules.is_empty() {
        bail!("access rules file {} defines no rules", path.display());
    }
    Ok(file.rules)
}

fn parse_seed(value: &str) -> Result<[u8; ED25519_KEY_LEN]> {
    let bytes = hex::decode(value.trim()).context("signing seed is not hex")?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| {
            anyhow::anyhow!(
                "signing seed must be {ED25519_KEY_LEN} bytes, got {}",
                bytes.len()
            )
        })
}
