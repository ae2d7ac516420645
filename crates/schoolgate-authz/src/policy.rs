//! Role-based access decisions over the resource access table.
//!
//! # Purpose
//! Answers "may a principal holding `role` perform `operation` on `resource`"
//! with a Casbin enforcer built once from [`AccessRule`]s.
//!
//! # Key invariants
//! - Rules are static after construction; there is no mutation API.
//! - Anything not granted by a rule is denied, including unknown resources.
//! - Enforcer failures are treated as a deny and logged.
use crate::{AccessRule, AuthzResult, Role, casbin_model};
use casbin::{CoreApi, Enforcer, MemoryAdapter, MgmtApi};
use std::collections::BTreeSet;

pub struct AccessPolicy {
    enforcer: Enforcer,
    rules: Vec<AccessRule>,
}

impl std::fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessPolicy")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl AccessPolicy {
    pub async fn from_rules(rules: &[AccessRule]) -> AuthzResult<Self> {
        let mut policies = BTreeSet::new();
        for rule in rules {
            rule.validate()?;
            for role in &rule.roles {
                policies.insert(vec![
                    role.as_str().to_string(),
                    rule.resource.clone(),
                    rule.operation.clone(),
                ]);
            }
        }

        let model = casbin_model().await?;
        let mut enforcer = Enforcer::new(model, MemoryAdapter::default()).await?;
        for policy in policies {
            enforcer.add_policy(policy).await?;
        }
        tracing::debug!(rules = rules.len(), "access policy loaded");

        Ok(Self {
            enforcer,
            rules: rules.to_vec(),
        })
    }

    pub fn allows(&self, role: Role, resource: &str, operation: &str) -> bool {
        match self.enforcer.enforce((role.as_str(), resource, operation)) {
            Ok(allowed) => allowed,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    role = %role,
                    resource,
                    operation,
                    "access policy evaluation failed"
                );
                false
            }
        }
    }

    pub fn permitted_roles(&self, resource: &str, operation: &str) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.allows(*role, resource, operation))
            .collect()
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }
}
