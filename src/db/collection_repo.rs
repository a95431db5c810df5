// src/db/collection_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::collection::{Collection, NewCollection},
};

const COLLECTION_SELECT: &str = r#"
    SELECT
        cb.id, cb.order_id, cb.file_name, cb.file_url,
        cb.arpillas_quantity, cb.arpillas_amount, cb.surplus_quantity, cb.surplus_amount,
        cb.total_recovered, cb.generated_by, cb.generated_at,
        o.delivery_date,
        r.name AS route_name,
        u.username
    FROM collections cb
    LEFT JOIN orders o ON o.id = cb.order_id
    LEFT JOIN delivery_routes r ON r.id = o.route_id
    LEFT JOIN users u ON u.id = cb.generated_by
"#;

#[derive(Clone)]
pub struct CollectionRepository {
    pool: PgPool,
}

impl CollectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, new: &NewCollection) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO collections (
                order_id, file_name, file_url, arpillas_quantity, arpillas_amount,
                surplus_quantity, surplus_amount, total_recovered, generated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(new.order_id)
        .bind(&new.file_name)
        .bind(&new.file_url)
        .bind(new.arpillas_quantity)
        .bind(new.arpillas_amount)
        .bind(new.surplus_quantity)
        .bind(new.surplus_amount)
        .bind(new.total_recovered)
        .bind(new.generated_by)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    pub async fn find_all(&self) -> Result<Vec<Collection>, AppError> {
        let sql = format!("{} ORDER BY cb.generated_at DESC", COLLECTION_SELECT);
        let collections = sqlx::query_as::<_, Collection>(&sql).fetch_all(&self.pool).await?;
        Ok(collections)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Collection>, AppError> {
        let sql = format!("{} WHERE cb.id = $1", COLLECTION_SELECT);
        let collection = sqlx::query_as::<_, Collection>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(collection)
    }

    pub async fn find_by_order(&self, order_id: i32) -> Result<Vec<Collection>, AppError> {
        let sql = format!("{} WHERE cb.order_id = $1 ORDER BY cb.generated_at DESC", COLLECTION_SELECT);
        let collections = sqlx::query_as::<_, Collection>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(collections)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM collections WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_by_order<'e, E>(&self, executor: E, order_id: i32) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM collections WHERE order_id = $1")
            .bind(order_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_by_order<'e, E>(&self, executor: E, order_id: i32) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM collections WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}
