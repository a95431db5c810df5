// src/db/order_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::order::{NewOrder, OrderFilter, OrderLine, OrderLineInput, OrderStatus, OrderSummary},
};

const ORDER_SELECT: &str = r#"
    SELECT
        o.id, o.user_id, o.route_id, o.delivery_date, o.status, o.returns, o.arrival_time,
        o.collection_generated, o.collection_url, o.created_at,
        u.username,
        r.name AS route_name
    FROM orders o
    LEFT JOIN users u ON u.id = o.user_id
    LEFT JOIN delivery_routes r ON r.id = o.route_id
"#;

const ORDER_FILTER: &str = r#"
    WHERE ($1::text[] IS NULL OR u.username = ANY($1))
      AND ($2::text[] IS NULL OR r.name = ANY($2))
      AND ($3::text[] IS NULL OR o.status::text = ANY($3))
      AND ($4::date IS NULL OR o.delivery_date >= $4)
      AND ($5::date IS NULL OR o.delivery_date <= $5)
"#;

const LINE_SELECT: &str = r#"
    SELECT
        oc.order_id, oc.community_id, oc.full_cost, oc.half_cost, oc.no_cost, oc.sponsored,
        oc.committee AS comite, oc.arpillas, oc.notes,
        c.name AS community_name, c.leader_name, c.contact, c.package_cost,
        m.name AS municipality_name
    FROM order_communities oc
    JOIN communities c ON c.id = oc.community_id
    LEFT JOIN municipalities m ON m.id = c.municipality_id
"#;

// Alterações de cabeçalho do PATCH /pedidos/:id
#[derive(Debug, Default, Clone)]
pub struct OrderHeaderChanges {
    pub delivery_date: Option<chrono::NaiveDate>,
    pub returns: Option<i32>,
    pub arrival_time: Option<String>,
    pub status: Option<OrderStatus>,
}

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_order<'e, E>(&self, executor: E, order: &NewOrder) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (user_id, route_id, delivery_date, status)
            VALUES ($1, $2, $3, 'creado')
            RETURNING id
            "#,
        )
        .bind(order.user_id)
        .bind(order.route_id)
        .bind(order.delivery_date)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    // Inserção em lote via UNNEST: uma única ida ao banco
    pub async fn insert_lines<'e, E>(
        &self,
        executor: E,
        order_id: i32,
        lines: &[OrderLineInput],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let community_ids: Vec<i32> = lines.iter().map(|l| l.id_comunidad).collect();
        let full: Vec<i32> = lines.iter().map(|l| l.despensas_costo).collect();
        let half: Vec<i32> = lines.iter().map(|l| l.despensas_medio_costo).collect();
        let no_cost: Vec<i32> = lines.iter().map(|l| l.despensas_sin_costo).collect();
        let sponsored: Vec<i32> = lines.iter().map(|l| l.despensas_apadrinadas).collect();
        let committee: Vec<i32> = lines.iter().map(|l| l.comite).collect();
        let arpillas: Vec<bool> = lines.iter().map(|l| l.arpilladas).collect();
        let notes: Vec<String> = lines.iter().map(|l| l.observaciones.clone()).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO order_communities
                (order_id, community_id, full_cost, half_cost, no_cost, sponsored, committee, arpillas, notes)
            SELECT $1, t.*
            FROM UNNEST($2::int[], $3::int[], $4::int[], $5::int[], $6::int[], $7::int[], $8::bool[], $9::text[])
                AS t(community_id, full_cost, half_cost, no_cost, sponsored, committee, arpillas, notes)
            "#,
        )
        .bind(order_id)
        .bind(community_ids)
        .bind(full)
        .bind(half)
        .bind(no_cost)
        .bind(sponsored)
        .bind(committee)
        .bind(arpillas)
        .bind(notes)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    // Quantas das comunidades informadas existem
    pub async fn count_existing_communities(&self, ids: &[i32]) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM communities WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn find_page(
        &self,
        filter: &OrderFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<(Vec<OrderSummary>, i64), AppError> {
        let statuses: Option<Vec<String>> = filter.statuses.as_ref().map(|list| {
            list.iter()
                .filter_map(|s| serde_json::to_value(s).ok())
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        });

        let sql = format!("{} {} ORDER BY o.id DESC LIMIT $6 OFFSET $7", ORDER_SELECT, ORDER_FILTER);
        let orders = sqlx::query_as::<_, OrderSummary>(&sql)
            .bind(filter.usernames.as_deref())
            .bind(filter.route_names.as_deref())
            .bind(statuses.as_deref())
            .bind(filter.from)
            .bind(filter.to)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!(
            r#"
            SELECT COUNT(*) FROM orders o
            LEFT JOIN users u ON u.id = o.user_id
            LEFT JOIN delivery_routes r ON r.id = o.route_id
            {}
            "#,
            ORDER_FILTER
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.usernames.as_deref())
            .bind(filter.route_names.as_deref())
            .bind(statuses.as_deref())
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(&self.pool)
            .await?;

        Ok((orders, total))
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<OrderSummary>, AppError> {
        let sql = format!("{} WHERE o.id = $1", ORDER_SELECT);
        let order = sqlx::query_as::<_, OrderSummary>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    pub async fn find_by_route(&self, route_id: i32) -> Result<Vec<OrderSummary>, AppError> {
        let sql = format!("{} WHERE o.route_id = $1 ORDER BY o.id DESC", ORDER_SELECT);
        let orders = sqlx::query_as::<_, OrderSummary>(&sql)
            .bind(route_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    pub async fn find_by_user(&self, user_id: i32) -> Result<Vec<OrderSummary>, AppError> {
        let sql = format!("{} WHERE o.user_id = $1 ORDER BY o.id DESC", ORDER_SELECT);
        let orders = sqlx::query_as::<_, OrderSummary>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    // Linhas de vários pedidos de uma vez (exportação)
    pub async fn find_lines(&self, order_ids: &[i32]) -> Result<Vec<OrderLine>, AppError> {
        let sql = format!("{} WHERE oc.order_id = ANY($1) ORDER BY oc.order_id, c.name", LINE_SELECT);
        let lines = sqlx::query_as::<_, OrderLine>(&sql)
            .bind(order_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }

    pub async fn update_header<'e, E>(
        &self,
        executor: E,
        id: i32,
        changes: &OrderHeaderChanges,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                delivery_date = COALESCE($2, delivery_date),
                returns = COALESCE($3, returns),
                arrival_time = COALESCE($4, arrival_time),
                status = COALESCE($5, status),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.delivery_date)
        .bind(changes.returns)
        .bind(changes.arrival_time.as_deref())
        .bind(changes.status)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_lines<'e, E>(&self, executor: E, order_id: i32) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM order_communities WHERE order_id = $1")
            .bind(order_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_order<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Volta o pedido para pendiente e libera a geração de uma nova cobranza
    pub async fn rollback(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = 'pendiente', collection_generated = FALSE, collection_url = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // Marca o pedido só se ainda não houver cobranza; false quando outra requisição chegou antes
    pub async fn claim_collection<'e, E>(&self, executor: E, id: i32, url: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET collection_generated = TRUE, collection_url = $2, updated_at = NOW()
            WHERE id = $1 AND collection_generated = FALSE
            "#,
        )
        .bind(id)
        .bind(url)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn clear_collection<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE orders
            SET collection_generated = FALSE, collection_url = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }
}
