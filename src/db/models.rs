//! Database models for Naturewatch
//!
//! This module defines the database entity structs that map to PostgreSQL tables.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// User Model
// ============================================================================

/// User entity representing a registered observer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub surname: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// User data for creation (password already hashed)
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub password_hash: String,
}

/// User without sensitive data (for API responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            surname: user.surname,
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Revoked Token Model
// ============================================================================

/// A token identifier invalidated before its natural expiry.
///
/// `expires_at` carries the revoked token's own expiry so rows can be
/// compacted once the token would have died anyway.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RevokedToken {
    pub jti: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: DateTime<Utc>,
}

// ============================================================================
// Sighting Model
// ============================================================================

/// Sighting entity representing a single species observation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sighting {
    pub id: Uuid,
    pub species: String,
    pub date: NaiveDate,
    pub count: i32,
    pub municipality: Option<String>,
    pub comment: Option<String>,
    /// Username of the submitting observer, when the request carried a token
    pub observer: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Sighting submission payload.
///
/// Unknown fields are rejected outright: the accepted shape is this struct,
/// not whatever the client sends.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSighting {
    pub species: String,
    pub date: NaiveDate,
    #[serde(default = "default_count")]
    pub count: i32,
    pub municipality: Option<String>,
    pub comment: Option<String>,
}

fn default_count() -> i32 {
    1
}
