// src/services/order_service.rs

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Utc};
use sqlx::PgPool;

use crate::{
    common::{
        db_utils::{split_csv, PageQuery},
        error::AppError,
    },
    db::{
        order_repo::OrderHeaderChanges, CollectionRepository, DeliveryRouteRepository, OrderRepository,
        UserRepository,
    },
    models::{
        auth::User,
        order::{
            CreateOrderPayload, ExportOrdersPayload, NewOrder, OrderDetail, OrderFilter, OrderLine,
            OrderLineInput, OrderListQuery, OrderPage, OrderStatus, OrderSummary, UpdateOrderPayload,
        },
    },
};

/// Janela padrão da listagem: o ano corrente inteiro.
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), AppError> {
    let invalid = || AppError::BadRequest(format!("Año inválido: {}", year));
    if !(1..=9999).contains(&year) {
        return Err(invalid());
    }
    let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?;
    Ok((start, end))
}

// "pendiente,creado" -> [Pendiente, Creado]; valores desconhecidos são 400
pub fn parse_statuses(raw: Option<&str>) -> Result<Option<Vec<OrderStatus>>, AppError> {
    let Some(values) = split_csv(raw) else {
        return Ok(None);
    };
    values
        .iter()
        .map(|v| {
            serde_json::from_value::<OrderStatus>(serde_json::Value::String(v.to_lowercase()))
                .map_err(|_| AppError::BadRequest(format!("Estatus de pedido inválido: {}", v)))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

impl OrderListQuery {
    pub fn to_filter(&self, today: NaiveDate) -> Result<OrderFilter, AppError> {
        let (start, end) = year_bounds(today.year())?;
        Ok(OrderFilter {
            usernames: split_csv(self.trabajadores.as_deref()),
            route_names: split_csv(self.rutas.as_deref()),
            statuses: parse_statuses(self.estatus.as_deref())?,
            from: Some(self.fecha_inicio.unwrap_or(start)),
            to: Some(self.fecha_fin.unwrap_or(end)),
        })
    }
}

impl ExportOrdersPayload {
    pub fn to_filter(&self) -> OrderFilter {
        let non_empty = |list: &Vec<String>| {
            let cleaned: Vec<String> = list
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            (!cleaned.is_empty()).then_some(cleaned)
        };
        OrderFilter {
            usernames: non_empty(&self.usuarios),
            route_names: non_empty(&self.rutas),
            statuses: (!self.estatus_pedido.is_empty()).then(|| self.estatus_pedido.clone()),
            from: self.start_date,
            to: self.end_date,
        }
    }
}

// Agrupa as linhas carregadas em lote de volta em cada pedido
fn attach_lines(orders: Vec<OrderSummary>, lines: Vec<OrderLine>) -> Vec<OrderDetail> {
    let mut by_order: HashMap<i32, Vec<OrderLine>> = HashMap::new();
    for line in lines {
        by_order.entry(line.order_id).or_default().push(line);
    }
    orders
        .into_iter()
        .map(|order| {
            let lines = by_order.remove(&order.id).unwrap_or_default();
            OrderDetail::new(order, lines)
        })
        .collect()
}

#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    repo: OrderRepository,
    collection_repo: CollectionRepository,
    route_repo: DeliveryRouteRepository,
    user_repo: UserRepository,
}

impl OrderService {
    pub fn new(
        pool: PgPool,
        repo: OrderRepository,
        collection_repo: CollectionRepository,
        route_repo: DeliveryRouteRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self { pool, repo, collection_repo, route_repo, user_repo }
    }

    async fn ensure_communities_exist(&self, lines: &[OrderLineInput]) -> Result<(), AppError> {
        if lines.is_empty() {
            return Ok(());
        }
        let ids: Vec<i32> = lines.iter().map(|l| l.id_comunidad).collect();
        let found = self.repo.count_existing_communities(&ids).await?;
        if found != ids.len() as i64 {
            tracing::warn!("Pedido referencia comunidades inexistentes: {:?}", ids);
            return Err(AppError::NotFound("Comunidad"));
        }
        Ok(())
    }

    pub async fn create(&self, caller: &User, payload: CreateOrderPayload) -> Result<OrderDetail, AppError> {
        let route_id = payload
            .id_ruta
            .ok_or_else(|| AppError::BadRequest("La ruta es obligatoria.".into()))?;
        let delivery_date = payload
            .fecha_entrega
            .ok_or_else(|| AppError::BadRequest("La fecha de entrega es obligatoria.".into()))?;
        let user_id = payload.id_ts.unwrap_or(caller.id);

        if self.route_repo.find_by_id(route_id).await?.is_none() {
            return Err(AppError::NotFound("Ruta"));
        }
        if user_id != caller.id && self.user_repo.find_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound("Usuario"));
        }
        self.ensure_communities_exist(&payload.comunidades).await?;

        let new_order = NewOrder { user_id, route_id, delivery_date };

        let mut tx = self.pool.begin().await?;
        let order_id = self.repo.insert_order(&mut *tx, &new_order).await?;
        self.repo.insert_lines(&mut *tx, order_id, &payload.comunidades).await?;
        tx.commit().await?;

        tracing::info!(
            "📦 Pedido {} criado por {} com {} comunidades",
            order_id,
            caller.id,
            payload.comunidades.len()
        );
        self.get_detail(order_id).await
    }

    pub async fn list(&self, query: &OrderListQuery) -> Result<OrderPage, AppError> {
        let filter = query.to_filter(Utc::now().date_naive())?;
        let (limit, offset) = PageQuery { page: query.page, page_size: query.page_size }.limit_offset();
        let (pedidos, total) = self.repo.find_page(&filter, Some(limit), offset).await?;
        Ok(OrderPage { pedidos, total })
    }

    pub async fn get(&self, id: i32) -> Result<OrderSummary, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Pedido"))
    }

    pub async fn get_detail(&self, id: i32) -> Result<OrderDetail, AppError> {
        let order = self.get(id).await?;
        let lines = self.repo.find_lines(&[id]).await?;
        Ok(OrderDetail::new(order, lines))
    }

    /// Atualiza cabeçalho e, se vierem linhas, substitui todas numa única transação.
    pub async fn update(&self, id: i32, payload: UpdateOrderPayload) -> Result<OrderDetail, AppError> {
        self.get(id).await?;
        if let Some(lines) = &payload.pedido_comunidad {
            self.ensure_communities_exist(lines).await?;
        }

        let changes = OrderHeaderChanges {
            delivery_date: payload.fecha_entrega,
            returns: payload.devoluciones,
            arrival_time: payload.hora_llegada,
            status: payload.estado,
        };

        let mut tx = self.pool.begin().await?;
        if !self.repo.update_header(&mut *tx, id, &changes).await? {
            return Err(AppError::NotFound("Pedido"));
        }
        if let Some(lines) = &payload.pedido_comunidad {
            self.repo.delete_lines(&mut *tx, id).await?;
            self.repo.insert_lines(&mut *tx, id, lines).await?;
        }
        tx.commit().await?;

        tracing::info!("✏️ Pedido {} atualizado", id);
        self.get_detail(id).await
    }

    // Cobranzas e linhas saem junto com o pedido
    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        self.collection_repo.delete_by_order(&mut *tx, id).await?;
        self.repo.delete_lines(&mut *tx, id).await?;
        if !self.repo.delete_order(&mut *tx, id).await? {
            return Err(AppError::NotFound("Pedido"));
        }
        tx.commit().await?;

        tracing::info!("🗑️ Pedido {} excluído", id);
        Ok(())
    }

    pub async fn by_route(&self, route_id: i32) -> Result<Vec<OrderSummary>, AppError> {
        self.repo.find_by_route(route_id).await
    }

    pub async fn by_user(&self, user_id: i32) -> Result<Vec<OrderSummary>, AppError> {
        self.repo.find_by_user(user_id).await
    }

    pub async fn export(&self, payload: &ExportOrdersPayload) -> Result<Vec<OrderDetail>, AppError> {
        let (orders, _) = self.repo.find_page(&payload.to_filter(), None, 0).await?;
        let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let lines = if ids.is_empty() { Vec::new() } else { self.repo.find_lines(&ids).await? };
        Ok(attach_lines(orders, lines))
    }

    pub async fn rollback(&self, id: i32) -> Result<OrderSummary, AppError> {
        if !self.repo.rollback(id).await? {
            return Err(AppError::NotFound("Pedido"));
        }
        tracing::info!("↩️ Pedido {} voltou para pendiente", id);
        self.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn summary(id: i32) -> OrderSummary {
        OrderSummary {
            id,
            user_id: Some(1),
            route_id: Some(1),
            delivery_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            status: OrderStatus::Creado,
            returns: 0,
            arrival_time: None,
            collection_generated: false,
            collection_url: None,
            username: Some("ana".into()),
            route_name: Some("Ruta Norte".into()),
            created_at: Utc::now(),
        }
    }

    fn line(order_id: i32, community_id: i32, full: i32) -> OrderLine {
        OrderLine {
            order_id,
            community_id,
            full_cost: full,
            half_cost: 0,
            no_cost: 0,
            sponsored: 0,
            comite: 0,
            arpillas: false,
            notes: String::new(),
            community_name: format!("Comunidad {}", community_id),
            leader_name: None,
            contact: None,
            package_cost: Decimal::new(170, 0),
            municipality_name: None,
        }
    }

    #[test]
    fn list_filter_defaults_to_current_year() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let query = OrderListQuery {
            trabajadores: Some("ana, luis".into()),
            estatus: Some("Pendiente".into()),
            ..Default::default()
        };

        let filter = query.to_filter(today).unwrap();

        assert_eq!(filter.from, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(filter.to, NaiveDate::from_ymd_opt(2025, 12, 31));
        assert_eq!(filter.usernames, Some(vec!["ana".to_string(), "luis".to_string()]));
        assert_eq!(filter.statuses, Some(vec![OrderStatus::Pendiente]));
        assert!(filter.route_names.is_none());
    }

    #[test]
    fn explicit_bounds_are_kept() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let query = OrderListQuery {
            fecha_inicio: NaiveDate::from_ymd_opt(2024, 11, 1),
            ..Default::default()
        };

        let filter = query.to_filter(today).unwrap();
        assert_eq!(filter.from, NaiveDate::from_ymd_opt(2024, 11, 1));
        assert_eq!(filter.to, NaiveDate::from_ymd_opt(2025, 12, 31));
    }

    #[test]
    fn unknown_status_is_bad_request() {
        let err = parse_statuses(Some("creado,perdido")).unwrap_err();
        assert_eq!(err.status().as_u16(), 400);
    }

    #[test]
    fn export_filter_ignores_empty_lists() {
        let payload = ExportOrdersPayload {
            usuarios: vec!["  ".into()],
            rutas: vec!["Ruta Sur".into()],
            ..Default::default()
        };

        let filter = payload.to_filter();
        assert!(filter.usernames.is_none());
        assert_eq!(filter.route_names, Some(vec!["Ruta Sur".to_string()]));
        assert!(filter.statuses.is_none());
        assert!(filter.from.is_none());
    }

    #[test]
    fn lines_are_attached_to_their_orders() {
        let orders = vec![summary(2), summary(1)];
        let lines = vec![line(1, 10, 2), line(2, 11, 1), line(1, 12, 3)];

        let details = attach_lines(orders, lines);

        assert_eq!(details[0].order.id, 2);
        assert_eq!(details[0].lines.len(), 1);
        assert_eq!(details[1].lines.len(), 2);
        assert_eq!(details[1].total, Decimal::new(850, 0));
    }

    // ---
    // Contra um Postgres real: DATABASE_URL definido e `cargo test -- --ignored`
    // ---

    fn service(pool: &PgPool) -> OrderService {
        OrderService::new(
            pool.clone(),
            OrderRepository::new(pool.clone()),
            CollectionRepository::new(pool.clone()),
            DeliveryRouteRepository::new(pool.clone()),
            UserRepository::new(pool.clone()),
        )
    }

    async fn seed_order(pool: &PgPool) -> (i32, i32, i32) {
        let (route_id, municipality_id): (i32, i32) = sqlx::query_as(
            r#"
            WITH r AS (INSERT INTO delivery_routes (name) VALUES ('Ruta Sur') RETURNING id),
                 m AS (INSERT INTO municipalities (name) VALUES ('Arandas') RETURNING id)
            SELECT r.id, m.id FROM r, m
            "#,
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let user_id: i32 = sqlx::query_scalar(
            "INSERT INTO users (username, email, password_hash) VALUES ('ts', 'ts@bamx.org', 'x') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();

        let mut ids = Vec::new();
        for name in ["Capilla", "Santa María"] {
            let id: i32 = sqlx::query_scalar(
                "INSERT INTO communities (name, route_id, municipality_id) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(name)
            .bind(route_id)
            .bind(municipality_id)
            .fetch_one(pool)
            .await
            .unwrap();
            ids.push(id);
        }

        let repo = OrderRepository::new(pool.clone());
        let order = NewOrder {
            user_id,
            route_id,
            delivery_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        };
        let order_id = repo.insert_order(pool, &order).await.unwrap();
        let first = OrderLineInput { id_comunidad: ids[0], despensas_costo: 5, ..Default::default() };
        repo.insert_lines(pool, order_id, &[first]).await.unwrap();

        (order_id, ids[0], ids[1])
    }

    fn replace_with(lines: Vec<OrderLineInput>) -> UpdateOrderPayload {
        UpdateOrderPayload {
            fecha_entrega: None,
            devoluciones: Some(2),
            hora_llegada: None,
            estado: None,
            pedido_comunidad: Some(lines),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn update_replaces_every_line(pool: PgPool) {
        let (order_id, _, santa_maria) = seed_order(&pool).await;
        let lines = vec![OrderLineInput { id_comunidad: santa_maria, despensas_costo: 7, ..Default::default() }];

        let detail = service(&pool).update(order_id, replace_with(lines)).await.unwrap();

        assert_eq!(detail.order.returns, 2);
        assert_eq!(detail.lines.len(), 1);
        assert_eq!(detail.lines[0].community_id, santa_maria);
        assert_eq!(detail.total, Decimal::new(1190, 0));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn update_with_unknown_community_keeps_order_intact(pool: PgPool) {
        let (order_id, capilla, _) = seed_order(&pool).await;
        let lines = vec![OrderLineInput { id_comunidad: 999_999, despensas_costo: 1, ..Default::default() }];

        let err = service(&pool).update(order_id, replace_with(lines)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Comunidad")));

        let detail = service(&pool).get_detail(order_id).await.unwrap();
        assert_eq!(detail.order.returns, 0);
        assert_eq!(detail.lines.len(), 1);
        assert_eq!(detail.lines[0].community_id, capilla);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn unknown_order_update_is_not_found(pool: PgPool) {
        let err = service(&pool).update(999_999, replace_with(Vec::new())).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
