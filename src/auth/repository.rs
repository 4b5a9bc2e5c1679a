// User credential storage

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::auth::{
    error::AuthError,
    models::{NewUser, User},
};

/// Persistence contract for user records
///
/// Every lookup signals "not found" with `Ok(None)`, distinct from storage failures.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError>;

    /// Find the user whose stored refresh token equals `token` exactly
    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, AuthError>;

    /// Insert a user; a duplicate username fails with `UsernameTaken`
    async fn create(&self, user: NewUser) -> Result<User, AuthError>;

    /// Persist role and refresh token of an existing user
    async fn update(&self, user: &User) -> Result<User, AuthError>;
}

const USER_COLUMNS: &str = "id, username, password_hash, role, refresh_token, created_at, updated_at";

/// PostgreSQL-backed user store
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE refresh_token = $1",
            USER_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Check for unique constraint violation
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::UsernameTaken;
                }
            }
            AuthError::DatabaseError(e.to_string())
        })
    }

    async fn update(&self, user: &User) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $1, refresh_token = $2, updated_at = NOW() WHERE id = $3 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.role)
        .bind(&user.refresh_token)
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::UserNotFound)
    }
}

/// In-process user store for tests and database-less development runs
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_id: i32,
    users: HashMap<i32, User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let state = self.inner.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, AuthError> {
        let state = self.inner.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.refresh_token.as_deref() == Some(token))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        let mut state = self.inner.write().await;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(AuthError::UsernameTaken);
        }

        state.next_id += 1;
        let now = Utc::now();
        let created = User {
            id: state.next_id,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User, AuthError> {
        let mut state = self.inner.write().await;
        let stored = state.users.get_mut(&user.id).ok_or(AuthError::UserNotFound)?;
        stored.role = user.role;
        stored.refresh_token = user.refresh_token.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_ids_and_rejects_duplicates() {
        let store = InMemoryUserStore::new();
        let alice = store.create(new_user("alice")).await.unwrap();
        let bob = store.create(new_user("bob")).await.unwrap();
        assert_ne!(alice.id, bob.id);
        assert!(alice.refresh_token.is_none());

        let dup = store.create(new_user("alice")).await;
        assert_eq!(dup.unwrap_err(), AuthError::UsernameTaken);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_lookups_signal_not_found_with_none() {
        let store = InMemoryUserStore::new();
        assert!(store.find_by_username("ghost").await.unwrap().is_none());
        assert!(store.find_by_id(42).await.unwrap().is_none());
        assert!(store.find_by_refresh_token("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_refresh_token() {
        let store = InMemoryUserStore::new();
        let mut user = store.create(new_user("carol")).await.unwrap();

        user.refresh_token = Some("first".to_string());
        store.update(&user).await.unwrap();
        assert_eq!(store.find_by_refresh_token("first").await.unwrap().unwrap().id, user.id);

        user.refresh_token = Some("second".to_string());
        store.update(&user).await.unwrap();
        assert!(store.find_by_refresh_token("first").await.unwrap().is_none());
        assert_eq!(store.find_by_refresh_token("second").await.unwrap().unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_update_unknown_user_fails() {
        let store = InMemoryUserStore::new();
        let mut user = store.create(new_user("dave")).await.unwrap();
        user.id = 999;
        assert_eq!(store.update(&user).await.unwrap_err(), AuthError::UserNotFound);
    }
}
