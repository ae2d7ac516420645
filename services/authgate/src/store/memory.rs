//! In-memory credential store.
//!
//! # Durability
//! Not durable: every account, including the bootstrap administrator, is
//! recreated at startup. Suitable for tests and single-instance deployments
//! that reseed from configuration.
//!
//! # Concurrency
//! One `tokio::sync::RwLock` guards both the records and the per-role
//! sequences so id assignment and insertion happen atomically.
use super::{Credential, CredentialStore, NewCredential, StoreError, StoreResult};
use crate::auth::login_id::{format_login_id, normalize_email};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use schoolgate_authz::Role;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Accounts {
    credentials: HashMap<String, Credential>,
    // Last issued sequence per role; never decremented so ids are not reused.
    sequences: HashMap<Role, u32>,
}

/// Cheap to clone; clones share the same accounts.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    accounts: Arc<RwLock<Accounts>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn register(&self, credential: NewCredential) -> StoreResult<Credential> {
        let email = normalize_email(&credential.email);
        let mut accounts = self.accounts.write().await;
        let duplicate_email = accounts
            .credentials
            .values()
            .any(|existing| existing.role == credential.role && existing.email == email);
        if duplicate_email {
            return Err(StoreError::Conflict(format!(
                "{} with this email already exists",
                credential.role
            )));
        }

        let now = Utc::now();
        let sequence = accounts.sequences.get(&credential.role).copied().unwrap_or(0) + 1;
        let login_id = format_login_id(credential.role, sequence, now.year(), &email);
        if accounts.credentials.contains_key(&login_id) {
            return Err(StoreError::Conflict(format!("{login_id} already exists")));
        }

        let record = Credential {
            login_id: login_id.clone(),
            role: credential.role,
            name: credential.name,
            email,
            password_hash: credential.password_hash,
            created_at: now.timestamp(),
        };
        accounts.sequences.insert(credential.role, sequence);
        accounts.credentials.insert(login_id, record.clone());
        Ok(record)
    }

    async fn find(&self, login_id: &str) -> StoreResult<Option<Credential>> {
        Ok(self.accounts.read().await.credentials.get(login_id).cloned())
    }

    async fn update_password(&self, login_id: &str, password_hash: String) -> StoreResult<()> {
        let mut accounts = self.accounts.write().await;
        let record = accounts
            .credentials
            .get_mut(login_id)
            .ok_or_else(|| StoreError::NotFound(login_id.to_string()))?;
        record.password_hash = password_hash;
        Ok(())
    }

    async fn delete(&self, login_id: &str) -> StoreResult<Credential> {
        self.accounts
            .write()
            .await
            .credentials
            .remove(login_id)
            .ok_or_else(|| StoreError::NotFound(login_id.to_string()))
    }

    async fn list(&self, role: Role) -> StoreResult<Vec<Credential>> {
        let accounts = self.accounts.read().await;
        let mut items: Vec<Credential> = accounts
            .credentials
            .values()
            .filter(|record| record.role == role)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.login_id.cmp(&b.login_id));
        Ok(items)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_credential(role: Role, email: &str) -> NewCredential {
        NewCredential {
            role,
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn yy() -> i32 {
        Utc::now().year() % 100
    }

    #[tokio::test]
    async fn register_generates_role_prefixed_ids() {
        let store = InMemoryStore::new();
        let admin = store
            .register(new_credential(Role::Administrator, "root@school.test"))
            .await
            .expect("admin");
        assert_eq!(admin.login_id, "ADM001");

        let teacher = store
            .register(new_credential(Role::Teacher, "t1@school.test"))
            .await
            .expect("teacher");
        assert_eq!(teacher.login_id, format!("TCH{:02}001", yy()));

        let second = store
            .register(new_credential(Role::Teacher, "t2@school.test"))
            .await
            .expect("teacher");
        assert_eq!(second.login_id, format!("TCH{:02}002", yy()));

        let parent = store
            .register(new_credential(Role::Parent, "Mom@Home.test"))
            .await
            .expect("parent");
        assert_eq!(parent.login_id, "mom@home.test");
    }

    #[tokio::test]
    async fn duplicate_email_within_role_conflicts() {
        let store = InMemoryStore::new();
        store
            .register(new_credential(Role::Student, "kid@school.test"))
            .await
            .expect("first");
        let err = store
            .register(new_credential(Role::Student, "KID@school.test"))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, StoreError::Conflict(_)));

        store
            .register(new_credential(Role::Teacher, "kid@school.test"))
            .await
            .expect("other role may reuse email");
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = InMemoryStore::new();
        let first = store
            .register(new_credential(Role::Administrator, "a@school.test"))
            .await
            .expect("first");
        store.delete(&first.login_id).await.expect("delete");
        let second = store
            .register(new_credential(Role::Administrator, "b@school.test"))
            .await
            .expect("second");
        assert_eq!(second.login_id, "ADM002");
        assert!(store.find(&first.login_id).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn update_and_list() {
        let store = InMemoryStore::new();
        let record = store
            .register(new_credential(Role::Student, "s@school.test"))
            .await
            .expect("register");
        store
            .update_password(&record.login_id, "new-hash".to_string())
            .await
            .expect("update");
        let found = store
            .find(&record.login_id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(found.password_hash, "new-hash");

        assert_eq!(store.list(Role::Student).await.expect("list").len(), 1);
        assert!(store.list(Role::Parent).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.delete("ADM404").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.update_password("ADM404", "x".to_string()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(store.health_check().await.is_ok());
        assert_eq!(store.backend_name(), "memory");
    }
}
