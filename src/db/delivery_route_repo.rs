// src/db/delivery_route_repo.rs

use sqlx::PgPool;

use crate::{common::error::AppError, models::delivery_route::DeliveryRoute};

#[derive(Clone)]
pub struct DeliveryRouteRepository {
    pool: PgPool,
}

impl DeliveryRouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, name: &str) -> Result<DeliveryRoute, AppError> {
        let route = sqlx::query_as::<_, DeliveryRoute>(
            "INSERT INTO delivery_routes (name) VALUES ($1) RETURNING id, name, created_at, updated_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(route)
    }

    pub async fn find_all(&self) -> Result<Vec<DeliveryRoute>, AppError> {
        let routes = sqlx::query_as::<_, DeliveryRoute>(
            "SELECT id, name, created_at, updated_at FROM delivery_routes ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(routes)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<DeliveryRoute>, AppError> {
        let route = sqlx::query_as::<_, DeliveryRoute>(
            "SELECT id, name, created_at, updated_at FROM delivery_routes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(route)
    }

    pub async fn update(&self, id: i32, name: &str) -> Result<Option<DeliveryRoute>, AppError> {
        let route = sqlx::query_as::<_, DeliveryRoute>(
            r#"
            UPDATE delivery_routes SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(route)
    }

    // Comunidades e pedidos que ainda apontam para a ruta
    pub async fn count_references(&self, id: i32) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM communities WHERE route_id = $1)
                 + (SELECT COUNT(*) FROM orders WHERE route_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM delivery_routes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
