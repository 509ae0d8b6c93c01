use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task;

use crate::config::SecurityConfig;
use crate::domain::UserId;

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
}

#[derive(Debug, Default)]
pub struct UserTableInner {
    users: HashMap<UserId, UserRecord>,
    username_index: HashMap<String, UserId>,
}

pub type UserTable = Arc<RwLock<UserTableInner>>;

pub struct UserRepository {
    table: UserTable,
}

impl UserRepository {
    #[must_use]
    pub const fn new(table: UserTable) -> Self {
        Self { table }
    }

    /// Inserts a user with an already-hashed password.
    pub async fn insert(&self, username: &str, password_hash: String) -> Result<User> {
        let mut table = self.table.write().await;

        if table.username_index.contains_key(username) {
            anyhow::bail!("User '{username}' already exists");
        }

        let mut id = UserId::new();
        while table.users.contains_key(&id) {
            id = UserId::new();
        }

        let user = User {
            id,
            username: username.to_string(),
            created_at: Utc::now(),
        };
        table.username_index.insert(user.username.clone(), id);
        table.users.insert(
            id,
            UserRecord {
                user: user.clone(),
                password_hash,
            },
        );

        Ok(user)
    }

    /// Hashes `password` on the blocking pool and inserts the user.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<User> {
        let password = password.to_string();
        let config = config.clone();
        let hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        self.insert(username, hash).await
    }

    /// Inserts a user from a stored argon2 PHC string, rejecting malformed ones.
    pub async fn create_with_hash(&self, username: &str, password_hash: &str) -> Result<User> {
        PasswordHash::new(password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash for '{username}': {e}"))?;

        self.insert(username, password_hash.to_string()).await
    }

    /// Get user by username (case-sensitive)
    pub async fn get_by_username(&self, username: &str) -> Option<User> {
        let table = self.table.read().await;
        table
            .username_index
            .get(username)
            .and_then(|id| table.users.get(id))
            .map(|record| record.user.clone())
    }

    pub async fn get_by_id(&self, id: UserId) -> Option<User> {
        let table = self.table.read().await;
        table.users.get(&id).map(|record| record.user.clone())
    }

    /// Verify password for a user, returning the user on success.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        let record = {
            let table = self.table.read().await;
            table
                .username_index
                .get(username)
                .and_then(|id| table.users.get(id))
                .cloned()
        };

        let Some(record) = record else {
            return Ok(None);
        };

        let password_hash = record.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then_some(record.user))
    }

    pub async fn count(&self) -> usize {
        self.table.read().await.users.len()
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the crate's default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        }
    }

    fn repo() -> UserRepository {
        UserRepository::new(UserTable::default())
    }

    #[test]
    fn test_hash_password_is_salted() {
        let a = hash_password("testpassword123", Some(&fast_config())).unwrap();
        let b = hash_password("testpassword123", Some(&fast_config())).unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_verify_password() {
        let repo = repo();
        let created = repo
            .create("testuser", "testpassword123", &fast_config())
            .await
            .unwrap();

        let verified = repo.verify_password("testuser", "testpassword123").await.unwrap();
        assert_eq!(verified, Some(created));

        assert!(repo.verify_password("testuser", "wrongpassword").await.unwrap().is_none());
        assert!(repo.verify_password("testuser", "").await.unwrap().is_none());
        assert!(repo.verify_password("missing", "testpassword123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_with_precomputed_hash() {
        let repo = repo();
        let hash = hash_password("testpassword456", Some(&fast_config())).unwrap();

        let user = repo.create_with_hash("testuser2", &hash).await.unwrap();

        let verified = repo.verify_password("testuser2", "testpassword456").await.unwrap();
        assert_eq!(verified, Some(user));
        assert!(repo.verify_password("testuser2", &hash).await.unwrap().is_none());

        assert!(repo.create_with_hash("testuser3", "plaintext").await.is_err());
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn test_username_is_unique_and_case_sensitive() {
        let repo = repo();
        repo.create("testuser", "testpassword123", &fast_config())
            .await
            .unwrap();

        assert!(repo.create("testuser", "another-password", &fast_config()).await.is_err());
        assert!(repo.get_by_username("TestUser").await.is_none());
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn test_lookup_by_id_and_username() {
        let repo = repo();
        let user = repo
            .create("testuser2", "testpassword456", &fast_config())
            .await
            .unwrap();

        assert_eq!(repo.get_by_id(user.id).await, Some(user.clone()));
        assert_eq!(repo.get_by_username("testuser2").await, Some(user));
        assert!(repo.get_by_id(UserId::new()).await.is_none());
    }
}
