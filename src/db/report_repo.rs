// src/db/report_repo.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::{
        delivery_route::DeliveryRoute,
        report::{ReportRow, ReportWindow},
    },
};

// Leitura plana para os relatórios; a agregação acontece em memória
#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn load_rows(&self, window: &ReportWindow) -> Result<Vec<ReportRow>, AppError> {
        let rows = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT
                o.id AS order_id, o.delivery_date, o.status, o.returns,
                o.user_id, u.username,
                o.route_id, r.name AS route_name,
                oc.community_id, c.name AS community_name,
                c.municipality_id, m.name AS municipality_name,
                c.package_cost,
                oc.full_cost, oc.half_cost, oc.no_cost, oc.sponsored
            FROM orders o
            LEFT JOIN users u ON u.id = o.user_id
            LEFT JOIN delivery_routes r ON r.id = o.route_id
            LEFT JOIN order_communities oc ON oc.order_id = o.id
            LEFT JOIN communities c ON c.id = oc.community_id
            LEFT JOIN municipalities m ON m.id = c.municipality_id
            WHERE ($1::date IS NULL OR o.delivery_date >= $1)
              AND ($2::date IS NULL OR o.delivery_date <= $2)
              AND ($3::int IS NULL OR o.route_id = $3)
              AND ($4::int IS NULL OR o.user_id = $4)
            ORDER BY o.delivery_date, o.id, c.name
            "#,
        )
        .bind(window.from)
        .bind(window.to)
        .bind(window.route_id)
        .bind(window.user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn load_routes(&self) -> Result<Vec<DeliveryRoute>, AppError> {
        let routes = sqlx::query_as::<_, DeliveryRoute>(
            "SELECT id, name, created_at, updated_at FROM delivery_routes ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(routes)
    }
}
