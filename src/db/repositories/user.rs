//! User repository for database operations
//!
//! Provides persistence for user accounts with secure password hashing using bcrypt.

use sqlx::PgPool;

use crate::db::models::{CreateUser, User};

/// Cost factor for bcrypt hashing (12 is recommended for production)
const BCRYPT_COST: u32 = 12;

/// Postgres error code for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// User repository error types
#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Hash a password using bcrypt with automatic salt generation
    pub fn hash_password(password: &str) -> Result<String, UserRepositoryError> {
        bcrypt::hash(password, BCRYPT_COST)
            .map_err(|e| UserRepositoryError::HashingError(e.to_string()))
    }

    /// Verify a password against a bcrypt hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, UserRepositoryError> {
        bcrypt::verify(password, hash).map_err(|e| UserRepositoryError::HashingError(e.to_string()))
    }

    /// Insert a new user record.
    ///
    /// The `username` column carries a UNIQUE constraint; a violation maps to
    /// `UsernameAlreadyExists` so concurrent registrations cannot slip past
    /// the caller's pre-check.
    pub async fn create(&self, dto: &CreateUser) -> Result<User, UserRepositoryError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, name, surname, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, name, surname, password_hash, created_at
            "#,
        )
        .bind(&dto.username)
        .bind(&dto.email)
        .bind(&dto.name)
        .bind(&dto.surname)
        .bind(&dto.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(UserRepositoryError::UsernameAlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find a user by username
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, name, surname, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// List all users, newest first
    pub async fn list_all(&self) -> Result<Vec<User>, UserRepositoryError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, name, surname, password_hash, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64, UserRepositoryError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
