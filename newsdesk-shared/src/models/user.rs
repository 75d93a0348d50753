/// User model and credential storage
///
/// This module provides the `User` record and the [`CredentialStore`] abstraction the
/// authentication service persists through, with two implementations:
///
/// - [`InMemoryCredentialStore`]: process-local map behind one async `RwLock`
/// - [`PgCredentialStore`]: PostgreSQL table with a unique `username` constraint
///
/// Both guarantee that exactly one of several concurrent registrations of the same
/// username succeeds.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     username VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     preferences TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```
/// use newsdesk_shared::models::user::{CredentialStore, InMemoryCredentialStore, NewUser};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryCredentialStore::new();
///
/// let user = store
///     .save(NewUser {
///         username: "alice".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     })
///     .await?;
///
/// let found = store.find_by_username("alice").await?;
/// assert_eq!(found.id, user.id);
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

/// User account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Login name, unique across all users
    pub username: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Free-form preferences string (None until first set)
    pub preferences: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login name
    pub username: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

/// Error type for credential store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No user with that username
    #[error("User not found: {0}")]
    NotFound(String),

    /// Username already taken
    #[error("Username already exists: {0}")]
    Conflict(String),

    /// Backing store unreachable or failing
    #[error("Credential store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Lookup and persistence of user records keyed by unique username
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Finds a user by username
    async fn find_by_username(&self, username: &str) -> Result<User, StoreError>;

    /// Persists a new user
    ///
    /// Must fail with `StoreError::Conflict` when the username exists, atomically with
    /// respect to concurrent calls.
    async fn save(&self, user: NewUser) -> Result<User, StoreError>;

    /// Replaces the preferences string of an existing user
    async fn update_preferences(
        &self,
        username: &str,
        preferences: &str,
    ) -> Result<User, StoreError>;

    /// Checks the store is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend name for health output
    fn backend(&self) -> &'static str;
}

/// Process-local credential store
///
/// The uniqueness check and the insert happen under a single write lock, so the store
/// itself serializes concurrent registrations.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Whether the store holds no users
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .get(username)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(username.to_string()))
    }

    async fn save(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        if users.contains_key(&user.username) {
            return Err(StoreError::Conflict(user.username));
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            username: user.username.clone(),
            password_hash: user.password_hash,
            preferences: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.username, record.clone());

        Ok(record)
    }

    async fn update_preferences(
        &self,
        username: &str,
        preferences: &str,
    ) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(username)
            .ok_or_else(|| StoreError::NotFound(username.to_string()))?;

        user.preferences = Some(preferences.to_string());
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// PostgreSQL-backed credential store
///
/// Uniqueness is enforced by the `users.username` unique constraint; a violation is
/// reported as `StoreError::Conflict`.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, preferences, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(username.to_string()))
    }

    async fn save(&self, user: NewUser) -> Result<User, StoreError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, preferences, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::Conflict(user.username))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_preferences(
        &self,
        username: &str,
        preferences: &str,
    ) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET preferences = $2, updated_at = NOW()
            WHERE username = $1
            RETURNING id, username, password_hash, preferences, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(preferences)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(username.to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
