// src/db/community_repo.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::community::{Community, CommunityInput},
};

// SELECT base com os nomes de ruta e municipio
const COMMUNITY_SELECT: &str = r#"
    SELECT
        c.id, c.name, c.leader_name, c.contact, c.address, c.package_cost, c.notes,
        c.route_id, c.municipality_id,
        r.name AS route_name,
        m.name AS municipality_name
    FROM communities c
    LEFT JOIN delivery_routes r ON r.id = c.route_id
    LEFT JOIN municipalities m ON m.id = c.municipality_id
"#;

#[derive(Clone)]
pub struct CommunityRepository {
    pool: PgPool,
}

impl CommunityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &CommunityInput) -> Result<Community, AppError> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO communities
                (name, leader_name, contact, address, package_cost, notes, route_id, municipality_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(input.leader_name.as_deref())
        .bind(input.contact.as_deref())
        .bind(input.address.as_deref())
        .bind(input.package_cost)
        .bind(input.notes.as_deref())
        .bind(input.route_id)
        .bind(input.municipality_id)
        .fetch_one(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Comunidad"))
    }

    // `limit` None devolve todas
    pub async fn find_all(&self, limit: Option<i64>, offset: i64) -> Result<Vec<Community>, AppError> {
        let sql = format!("{} ORDER BY c.name LIMIT $1 OFFSET $2", COMMUNITY_SELECT);
        let communities = sqlx::query_as::<_, Community>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(communities)
    }

    pub async fn search(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Community>, i64), AppError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let filter = r#"
            WHERE ($1::text IS NULL
                OR c.name ILIKE $1
                OR r.name ILIKE $1
                OR m.name ILIKE $1
                OR c.leader_name ILIKE $1)
        "#;

        let sql = format!("{} {} ORDER BY c.name LIMIT $2 OFFSET $3", COMMUNITY_SELECT, filter);
        let communities = sqlx::query_as::<_, Community>(&sql)
            .bind(pattern.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!(
            r#"
            SELECT COUNT(*) FROM communities c
            LEFT JOIN delivery_routes r ON r.id = c.route_id
            LEFT JOIN municipalities m ON m.id = c.municipality_id
            {}
            "#,
            filter
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await?;

        Ok((communities, total))
    }

    pub async fn find_by_route(&self, route_id: i32) -> Result<Vec<Community>, AppError> {
        let sql = format!("{} WHERE c.route_id = $1 ORDER BY c.name", COMMUNITY_SELECT);
        let communities = sqlx::query_as::<_, Community>(&sql)
            .bind(route_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(communities)
    }

    pub async fn find_by_municipality(&self, municipality_id: i32) -> Result<Vec<Community>, AppError> {
        let sql = format!("{} WHERE c.municipality_id = $1 ORDER BY c.name", COMMUNITY_SELECT);
        let communities = sqlx::query_as::<_, Community>(&sql)
            .bind(municipality_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(communities)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Community>, AppError> {
        let sql = format!("{} WHERE c.id = $1", COMMUNITY_SELECT);
        let community = sqlx::query_as::<_, Community>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(community)
    }

    pub async fn update(&self, id: i32, input: &CommunityInput) -> Result<Option<Community>, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE communities SET
                name = $2, leader_name = $3, contact = $4, address = $5,
                package_cost = $6, notes = $7, route_id = $8, municipality_id = $9,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.leader_name.as_deref())
        .bind(input.contact.as_deref())
        .bind(input.address.as_deref())
        .bind(input.package_cost)
        .bind(input.notes.as_deref())
        .bind(input.route_id)
        .bind(input.municipality_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    pub async fn is_used_by_orders(&self, id: i32) -> Result<bool, AppError> {
        let used: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM order_communities WHERE community_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(used)
    }

    pub async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM communities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
