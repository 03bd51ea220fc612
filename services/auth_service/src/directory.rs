use async_trait::async_trait;
use chrono::Utc;
use shared_errors::AppError;
use shared_models::{Role, User};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

/// A new identity to persist. The hash is produced by the caller; the
/// directory never sees a raw password.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Identity lookup seam between the admission core and storage.
///
/// Postgres in production, in-memory for tests and local development,
/// mirroring the store-trait split used for other pluggable backends.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Persist a new identity. Duplicate username or email yields
    /// `AppError::Conflict`.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;
}

pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, role, enabled, created_at, updated_at
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, role, enabled)
             VALUES ($1, $2, $3, $4, true)
             RETURNING id, username, email, password_hash, role, enabled, created_at, updated_at",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AppError::conflict("Username or email already registered")
            }
            _ => AppError::from(e),
        })?;
        Ok(created)
    }
}

/// In-memory directory for tests and local development.
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, User>>,
    next_id: AtomicI64,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Seed a user directly, bypassing uniqueness checks. Test helper.
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.username.clone(), user);
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        let duplicate = users
            .values()
            .any(|u| u.username == user.username || u.email == user.email);
        if duplicate {
            return Err(AppError::conflict("Username or email already registered"));
        }

        let now = Utc::now();
        let created = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            enabled: true,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.username.clone(), created.clone());
        Ok(created)
    }
}
