//! Sighting repository for database operations

use sqlx::PgPool;

use crate::db::models::{CreateSighting, Sighting};

/// Sighting repository error types
#[derive(Debug, thiserror::Error)]
pub enum SightingRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Sighting repository for database operations
#[derive(Clone)]
pub struct SightingRepository {
    pool: PgPool,
}

impl SightingRepository {
    /// Create a new sighting repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a sighting, optionally attributed to an observer
    pub async fn create(
        &self,
        dto: &CreateSighting,
        observer: Option<&str>,
    ) -> Result<Sighting, SightingRepositoryError> {
        let sighting = sqlx::query_as::<_, Sighting>(
            r#"
            INSERT INTO sightings (species, date, count, municipality, comment, observer)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, species, date, count, municipality, comment, observer, created_at
            "#,
        )
        .bind(&dto.species)
        .bind(dto.date)
        .bind(dto.count)
        .bind(&dto.municipality)
        .bind(&dto.comment)
        .bind(observer)
        .fetch_one(&self.pool)
        .await?;

        Ok(sighting)
    }

    /// List recent sightings, newest first
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Sighting>, SightingRepositoryError> {
        let sightings = sqlx::query_as::<_, Sighting>(
            r#"
            SELECT id, species, date, count, municipality, comment, observer, created_at
            FROM sightings
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sightings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_and_list_sightings() {
        let config = crate::db::pool::DbConfig::from_env().expect("DATABASE_URL must be set");
        let pool = crate::db::pool::create_pool_with_migrations(&config)
            .await
            .expect("Failed to create pool");
        let repo = SightingRepository::new(pool);

        let dto = CreateSighting {
            species: "Erithacus rubecula".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
            count: 2,
            municipality: Some("Grenoble".to_string()),
            comment: None,
        };

        let created = repo.create(&dto, Some("alice")).await.unwrap();
        assert_eq!(created.species, "Erithacus rubecula");
        assert_eq!(created.observer, Some("alice".to_string()));

        let recent = repo.list_recent(10).await.unwrap();
        assert!(recent.iter().any(|s| s.id == created.id));
    }
}
