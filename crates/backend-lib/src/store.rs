// ============================
// crates/backend-lib/src/store.rs
// ============================
//! Storage abstraction with in-memory implementations.
//!
//! The credential store keeps its unique indexes and records behind a single
//! lock so uniqueness checks and inserts form one critical section; two
//! concurrent registrations of the same identity can never both succeed.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::config::BootstrapAdmin;
use crate::error::AppError;
use pagevault_common::{Page, PublicUser, RoleFlags};

/// A stored user record. Internal to the backend; the password hash never
/// leaves this layer except into the verifier.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub flags: RoleFlags,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Sanitized view for the HTTP surface
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            flags: self.flags,
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

/// Fields required to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub flags: RoleFlags,
}

/// Trait for credential storage backends
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Look up a user by id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Create a user. Fails with [`AppError::DuplicateIdentity`] when the
    /// username or email is already taken; the check and the insert are
    /// atomic.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Record a successful authentication time
    async fn update_last_login(&self, id: Uuid, time: DateTime<Utc>) -> Result<(), AppError>;

    /// Replace a user's role flags, returning the updated record
    async fn set_role_flags(&self, id: Uuid, flags: RoleFlags) -> Result<User, AppError>;

    /// Delete a user
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    /// List all users
    async fn list(&self) -> Result<Vec<User>, AppError>;
}

/// Trait for page storage backends
#[async_trait]
pub trait PageStore: Send + Sync {
    /// List a user's pages, oldest first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Page>, AppError>;

    /// Create a page owned by `user_id`
    async fn create(&self, user_id: Uuid, title: String, content: String)
        -> Result<Page, AppError>;

    /// Update a page the user owns; a foreign or unknown id is `NotFound`
    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        title: String,
        content: String,
    ) -> Result<Page, AppError>;

    /// Delete a page the user owns; a foreign or unknown id is `NotFound`
    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError>;
}

#[derive(Default)]
struct UserTable {
    users: HashMap<Uuid, User>,
    by_username: HashMap<String, Uuid>,
    by_email: HashMap<String, Uuid>,
}

/// In-memory implementation of the credential store
#[derive(Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<UserTable>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let table = self.inner.read().await;
        Ok(table
            .by_username
            .get(username)
            .and_then(|id| table.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let table = self.inner.read().await;
        Ok(table.users.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut table = self.inner.write().await;

        // uniqueness check and insert under one write lock
        if table.by_username.contains_key(&new_user.username)
            || table.by_email.contains_key(&new_user.email)
        {
            return Err(AppError::DuplicateIdentity);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            flags: new_user.flags,
            created_at: Utc::now(),
            last_login: None,
        };

        table.by_username.insert(user.username.clone(), user.id);
        table.by_email.insert(user.email.clone(), user.id);
        table.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_last_login(&self, id: Uuid, time: DateTime<Utc>) -> Result<(), AppError> {
        let mut table = self.inner.write().await;
        let user = table.users.get_mut(&id).ok_or(AppError::NotFound("user"))?;
        user.last_login = Some(time);
        Ok(())
    }

    async fn set_role_flags(&self, id: Uuid, flags: RoleFlags) -> Result<User, AppError> {
        let mut table = self.inner.write().await;
        let user = table.users.get_mut(&id).ok_or(AppError::NotFound("user"))?;
        user.flags = flags;
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut table = self.inner.write().await;
        let user = table.users.remove(&id).ok_or(AppError::NotFound("user"))?;
        table.by_username.remove(&user.username);
        table.by_email.remove(&user.email);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let table = self.inner.read().await;
        let mut users: Vec<User> = table.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }
}

/// In-memory implementation of the page store
#[derive(Default)]
pub struct InMemoryPageStore {
    pages: DashMap<Uuid, Page>,
}

impl InMemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageStore for InMemoryPageStore {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Page>, AppError> {
        let mut pages: Vec<Page> = self
            .pages
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        pages.sort_by_key(|p| p.created_at);
        Ok(pages)
    }

    async fn create(
        &self,
        user_id: Uuid,
        title: String,
        content: String,
    ) -> Result<Page, AppError> {
        let page = Page {
            id: Uuid::new_v4(),
            title,
            content,
            user_id,
            created_at: Utc::now(),
        };
        self.pages.insert(page.id, page.clone());
        Ok(page)
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        title: String,
        content: String,
    ) -> Result<Page, AppError> {
        let mut entry = self
            .pages
            .get_mut(&id)
            .filter(|entry| entry.value().user_id == user_id)
            .ok_or(AppError::NotFound("page"))?;
        let page = entry.value_mut();
        page.title = title;
        page.content = content;
        Ok(page.clone())
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let owned = self
            .pages
            .get(&id)
            .map(|entry| entry.value().user_id == user_id)
            .unwrap_or(false);
        if !owned {
            return Err(AppError::NotFound("page"));
        }
        self.pages.remove(&id);
        Ok(())
    }
}

/// Create the configured bootstrap admin when the store holds no admin yet.
///
/// Replaces the upstream system's registration-time admin backdoor; the
/// account exists only if explicitly configured.
pub async fn ensure_bootstrap_admin(
    store: &dyn CredentialStore,
    bootstrap: &BootstrapAdmin,
) -> Result<(), AppError> {
    let has_admin = store
        .list()
        .await?
        .iter()
        .any(|user| user.flags.is_admin);
    if has_admin {
        return Ok(());
    }

    let password_hash =
        hash_password(&bootstrap.password).map_err(|e| AppError::Internal(e.to_string()))?;
    let user = store
        .create(NewUser {
            username: bootstrap.username.clone(),
            email: bootstrap.email.clone(),
            password_hash,
            flags: RoleFlags {
                is_admin: true,
                ..RoleFlags::default()
            },
        })
        .await?;
    tracing::info!(username = %user.username, "bootstrap admin created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$scrypt$fake".to_string(),
            flags: RoleFlags::default(),
        }
    }

    #[tokio::test]
    async fn create_and_find_user() {
        let store = InMemoryCredentialStore::new();
        let created = store.create(new_user("alice", "a@x.com")).await.unwrap();

        let by_name = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        assert_eq!(by_name.email, "a@x.com");
        assert!(by_name.last_login.is_none());

        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        assert!(store.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_and_email_are_rejected() {
        let store = InMemoryCredentialStore::new();
        store.create(new_user("alice", "a@x.com")).await.unwrap();

        let same_name = store.create(new_user("alice", "other@x.com")).await;
        assert!(matches!(same_name, Err(AppError::DuplicateIdentity)));

        let same_email = store.create(new_user("other", "a@x.com")).await;
        assert!(matches!(same_email, Err(AppError::DuplicateIdentity)));
    }

    #[tokio::test]
    async fn concurrent_duplicate_registration_single_winner() {
        let store = Arc::new(InMemoryCredentialStore::new());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create(new_user("alice", "a@x.com")).await })
            })
            .collect();

        let mut created = 0;
        let mut conflicts = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::DuplicateIdentity) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(conflicts, 7);
    }

    #[tokio::test]
    async fn last_login_and_role_flags_update() {
        let store = InMemoryCredentialStore::new();
        let user = store.create(new_user("alice", "a@x.com")).await.unwrap();

        let now = Utc::now();
        store.update_last_login(user.id, now).await.unwrap();
        assert_eq!(
            store.find_by_id(user.id).await.unwrap().unwrap().last_login,
            Some(now)
        );

        let updated = store
            .set_role_flags(
                user.id,
                RoleFlags {
                    is_admin: true,
                    ..RoleFlags::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.flags.is_admin);

        let missing = store
            .set_role_flags(Uuid::new_v4(), RoleFlags::default())
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_frees_identity_for_reuse() {
        let store = InMemoryCredentialStore::new();
        let user = store.create(new_user("alice", "a@x.com")).await.unwrap();

        store.delete(user.id).await.unwrap();
        assert!(store.find_by_username("alice").await.unwrap().is_none());
        assert!(matches!(
            store.delete(user.id).await,
            Err(AppError::NotFound(_))
        ));

        // username and email become available again
        store.create(new_user("alice", "a@x.com")).await.unwrap();
    }

    #[tokio::test]
    async fn public_view_has_no_password_hash() {
        let store = InMemoryCredentialStore::new();
        let user = store.create(new_user("alice", "a@x.com")).await.unwrap();
        let json = serde_json::to_string(&user.to_public()).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("$scrypt$"));
    }

    #[tokio::test]
    async fn pages_are_owner_scoped() {
        let store = InMemoryPageStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let page = store
            .create(alice, "Notes".to_string(), "hello".to_string())
            .await
            .unwrap();

        assert_eq!(store.list_for_user(alice).await.unwrap().len(), 1);
        assert!(store.list_for_user(bob).await.unwrap().is_empty());

        // bob cannot update or delete alice's page
        let update = store
            .update(page.id, bob, "x".to_string(), "y".to_string())
            .await;
        assert!(matches!(update, Err(AppError::NotFound(_))));
        assert!(matches!(
            store.delete(page.id, bob).await,
            Err(AppError::NotFound(_))
        ));

        let updated = store
            .update(page.id, alice, "Notes v2".to_string(), "world".to_string())
            .await
            .unwrap();
        assert_eq!(updated.title, "Notes v2");

        store.delete(page.id, alice).await.unwrap();
        assert!(store.list_for_user(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_admin_created_once() {
        let store = InMemoryCredentialStore::new();
        let bootstrap = BootstrapAdmin {
            username: "root".to_string(),
            password: "correct horse battery staple".to_string(),
            email: "root@example.com".to_string(),
        };

        ensure_bootstrap_admin(&store, &bootstrap).await.unwrap();
        let admin = store.find_by_username("root").await.unwrap().unwrap();
        assert!(admin.flags.is_admin);

        // second call is a no-op, not a duplicate error
        ensure_bootstrap_admin(&store, &bootstrap).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
