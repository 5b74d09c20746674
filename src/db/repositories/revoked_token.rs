//! Revoked token repository
//!
//! Tracks token identifiers (jti claims) invalidated before their natural
//! expiry. Every protected request consults this set during token
//! verification; logout inserts into it.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::db::models::RevokedToken;

/// Revoked token repository error types
#[derive(Debug, thiserror::Error)]
pub enum RevokedTokenRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Repository over the revocation set
#[derive(Clone)]
pub struct RevokedTokenRepository {
    pool: PgPool,
}

impl RevokedTokenRepository {
    /// Create a new revoked token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a jti as revoked.
    ///
    /// Idempotent: revoking an already-revoked jti is a no-op, so logging out
    /// twice with the same token succeeds both times.
    pub async fn revoke(
        &self,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RevokedTokenRepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Check whether a jti has been revoked
    pub async fn is_revoked(&self, jti: &str) -> Result<bool, RevokedTokenRepositoryError> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = $1)")
                .bind(jti)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.0)
    }

    /// Find a revocation record by jti
    pub async fn find(
        &self,
        jti: &str,
    ) -> Result<Option<RevokedToken>, RevokedTokenRepositoryError> {
        let record = sqlx::query_as::<_, RevokedToken>(
            r#"
            SELECT jti, expires_at, revoked_at
            FROM revoked_tokens
            WHERE jti = $1
            "#,
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Drop revocation records for tokens that are past their own expiry.
    ///
    /// An expired token fails verification regardless of revocation, so the
    /// record carries no information anymore. Run periodically.
    pub async fn cleanup_expired(&self) -> Result<u64, RevokedTokenRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM revoked_tokens
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
