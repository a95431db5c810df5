// src/db/municipality_repo.rs

use sqlx::PgPool;

use crate::{
    common::error::{unique_violation, AppError},
    models::municipality::Municipality,
};

#[derive(Clone)]
pub struct MunicipalityRepository {
    pool: PgPool,
}

impl MunicipalityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Municipality>, AppError> {
        let municipalities =
            sqlx::query_as::<_, Municipality>("SELECT id, name FROM municipalities ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(municipalities)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Municipality>, AppError> {
        let municipality =
            sqlx::query_as::<_, Municipality>("SELECT id, name FROM municipalities WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(municipality)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Municipality>, AppError> {
        let municipality = sqlx::query_as::<_, Municipality>(
            "SELECT id, name FROM municipalities WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(municipality)
    }

    pub async fn create(&self, name: &str) -> Result<Municipality, AppError> {
        sqlx::query_as::<_, Municipality>(
            "INSERT INTO municipalities (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(constraint) => AppError::UniqueConstraintViolation(constraint),
            None => e.into(),
        })
    }
}
